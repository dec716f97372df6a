use super::CampaignRecord;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    records: Vec<CampaignRecord>,
    last_id: u64,
}

/// Campaign records in launch order. Ids start at 1 and are never reused.
#[derive(Default)]
pub struct CampaignStore {
    inner: Mutex<Inner>,
}

impl CampaignStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Allocate an id and store a running record for it.
    pub fn create(&self, domain: &str) -> u64 {
        let mut inner = self.lock();
        inner.last_id += 1;
        let id = inner.last_id;
        inner.records.push(CampaignRecord::new(id, domain));
        id
    }

    /// Apply `f` to the record, if it exists.
    pub fn update<F>(&self, id: u64, f: F) -> bool
    where
        F: FnOnce(&mut CampaignRecord),
    {
        let mut inner = self.lock();
        match inner.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: u64) -> Option<CampaignRecord> {
        self.lock().records.iter().find(|r| r.id == id).cloned()
    }

    pub fn list(&self) -> Vec<CampaignRecord> {
        self.lock().records.clone()
    }
}
