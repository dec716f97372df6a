use crate::{Error, Result};
use std::collections::HashMap;

/// Values substituted into `${name}` placeholders of a site profile.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: HashMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Substitute `${var}` placeholders. A placeholder with no value is an error;
/// substituted values are not scanned again.
pub fn render(template: &str, params: &Params) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        let name = &rest[start + 2..start + 2 + len];
        let value = params
            .get(name)
            .ok_or_else(|| Error::Config(format!("unknown parameter: {}", name)))?;

        out.push_str(&rest[..start]);
        out.push_str(value);
        rest = &rest[start + 2 + len + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Percent-encode a value for use inside a query string.
pub fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
