use crate::{Error, Result};
use eoka::{Browser, Page};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Attribute used to tag elements found by text so they can be addressed by
/// a plain CSS selector afterwards.
const TARGET_ATTR: &str = "data-outreach-target";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
    pub viewport: Viewport,
    /// JSON file cookies are restored from on launch and saved to afterwards.
    pub cookie_jar: Option<PathBuf>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: false,
            proxy: None,
            user_agent: None,
            viewport: Viewport {
                width: 1366,
                height: 900,
            },
            cookie_jar: None,
        }
    }
}

impl BrowserOptions {
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn cookie_jar(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookie_jar = Some(path.into());
        self
    }
}

/// A cookie as persisted in the jar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl StoredCookie {
    /// Keep the fields needed to restore a session from whatever the browser
    /// reports (which carries expiry, flags and more).
    pub fn from_browser_json(value: serde_json::Value) -> Result<Vec<Self>> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn read_jar(path: &Path) -> Result<Vec<Self>> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn write_jar(path: &Path, cookies: &[Self]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(cookies)?)?;
        Ok(())
    }
}

/// One stealth browser with a single page.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    cookie_jar: Option<PathBuf>,
}

impl BrowserSession {
    /// Launch the browser and restore saved cookies when a jar exists.
    pub async fn launch(options: &BrowserOptions) -> Result<Self> {
        let stealth = eoka::StealthConfig {
            headless: options.headless,
            proxy: options.proxy.clone(),
            user_agent: options.user_agent.clone(),
            viewport_width: options.viewport.width,
            viewport_height: options.viewport.height,
            ..Default::default()
        };

        debug!(
            "Launching browser (headless: {}, proxy: {:?})",
            options.headless, options.proxy
        );
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;
        let session = Self {
            browser,
            page,
            cookie_jar: options.cookie_jar.clone(),
        };

        match session.restore_cookies().await {
            Ok(0) => {}
            Ok(n) => info!("Restored {} cookies", n),
            Err(e) => warn!("Could not restore cookies: {}", e),
        }

        Ok(session)
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    async fn restore_cookies(&self) -> Result<usize> {
        let Some(ref jar) = self.cookie_jar else {
            return Ok(0);
        };
        if !jar.exists() {
            debug!("No cookie jar at {}", jar.display());
            return Ok(0);
        }
        let cookies = StoredCookie::read_jar(jar)?;
        for c in &cookies {
            self.page
                .set_cookie(&c.name, &c.value, c.domain.as_deref(), c.path.as_deref())
                .await?;
        }
        Ok(cookies.len())
    }

    /// Write the page's cookies to the jar. Returns how many were saved.
    pub async fn save_cookies(&self) -> Result<usize> {
        let jar = self
            .cookie_jar
            .as_ref()
            .ok_or_else(|| Error::Config("no cookie jar configured".into()))?;
        let raw = serde_json::to_value(self.page.cookies().await?)?;
        let cookies = StoredCookie::from_browser_json(raw)?;
        StoredCookie::write_jar(jar, &cookies)?;
        info!("Saved {} cookies to {}", cookies.len(), jar.display());
        Ok(cookies.len())
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        debug!("goto: {}", url);
        self.page.goto(url).await?;
        Ok(())
    }

    pub async fn url(&self) -> Result<String> {
        Ok(self.page.url().await?)
    }

    pub async fn text(&self) -> Result<String> {
        Ok(self.page.text().await?)
    }

    pub async fn html(&self) -> Result<String> {
        Ok(self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await?)
    }

    pub async fn pause(&self, duration: Duration) {
        self.page.wait(duration.as_millis() as u64).await;
    }

    /// Best-effort wait for network activity to settle.
    pub async fn settle(&self) {
        let _ = self.page.wait_for_network_idle(500, 5000).await;
    }

    /// Number of elements matching `selector`; zero for invalid selectors.
    pub async fn count(&self, selector: &str) -> Result<usize> {
        let js = format!(
            "(() => {{ try {{ return document.querySelectorAll({}).length; }} catch (e) {{ return 0; }} }})()",
            json_str(selector)
        );
        let n: u64 = self.page.evaluate(&js).await?;
        Ok(n as usize)
    }

    /// First selector in the list that currently matches anything.
    pub async fn first_present(&self, selectors: &[String]) -> Result<Option<String>> {
        for sel in selectors {
            if self.count(sel).await? > 0 {
                return Ok(Some(sel.clone()));
            }
        }
        Ok(None)
    }

    /// Poll until one of the selectors matches or the timeout passes.
    pub async fn wait_for_any(
        &self,
        selectors: &[String],
        timeout: Duration,
    ) -> Result<Option<String>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(sel) = self.first_present(selectors).await? {
                return Ok(Some(sel));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            self.pause(Duration::from_millis(500)).await;
        }
    }

    /// Trimmed visible text of every element matching `selector`.
    pub async fn texts(&self, selector: &str) -> Result<Vec<String>> {
        let js = format!(
            r#"(() => {{
                try {{
                    return Array.from(document.querySelectorAll({}))
                        .map(el => (el.innerText || el.textContent || '').trim());
                }} catch (e) {{ return []; }}
            }})()"#,
            json_str(selector)
        );
        Ok(self.page.evaluate(&js).await?)
    }

    /// Text of the first element inside `scope` matching one of `selectors`.
    pub async fn text_in(&self, scope: &str, selectors: &[String]) -> Result<Option<String>> {
        self.query_in(scope, selectors, "text").await
    }

    /// Attribute of the first element inside `scope` matching one of `selectors`.
    pub async fn attr_in(
        &self,
        scope: &str,
        selectors: &[String],
        attr: &str,
    ) -> Result<Option<String>> {
        self.query_in(scope, selectors, attr).await
    }

    async fn query_in(&self, scope: &str, selectors: &[String], what: &str) -> Result<Option<String>> {
        let js = format!(
            r#"(() => {{
                const root = document.querySelector({scope});
                if (!root) return null;
                for (const sel of {sels}) {{
                    let el = null;
                    try {{ el = root.querySelector(sel); }} catch (e) {{ continue; }}
                    if (!el) continue;
                    const v = {what} === 'text'
                        ? (el.innerText || el.textContent || '').trim()
                        : (el[{what}] || el.getAttribute({what}) || '');
                    if (v) return String(v);
                }}
                return null;
            }})()"#,
            scope = json_str(scope),
            sels = json_list(selectors),
            what = json_str(what),
        );
        Ok(self.page.evaluate(&js).await?)
    }

    /// Tag every element matched by the first productive selector with
    /// `attr="0"`, `attr="1"`, … and return how many were tagged.
    pub async fn mark_all(&self, selectors: &[String], attr: &str) -> Result<usize> {
        let js = format!(
            r#"(() => {{
                document.querySelectorAll('[' + {attr} + ']').forEach(el => el.removeAttribute({attr}));
                for (const sel of {sels}) {{
                    let found = [];
                    try {{ found = Array.from(document.querySelectorAll(sel)); }} catch (e) {{ continue; }}
                    if (found.length === 0) continue;
                    found.forEach((el, i) => el.setAttribute({attr}, String(i)));
                    return found.length;
                }}
                return 0;
            }})()"#,
            attr = json_str(attr),
            sels = json_list(selectors),
        );
        let n: u64 = self.page.evaluate(&js).await?;
        Ok(n as usize)
    }

    /// Find an enabled element among `candidates` (inside `scope`, or the
    /// whole page) whose text or aria-label contains one of `labels`,
    /// ignoring case. Labels are tried in order. Returns a selector for it.
    pub async fn find_by_label(
        &self,
        scope: Option<&str>,
        candidates: &str,
        labels: &[String],
    ) -> Result<Option<String>> {
        let js = format!(
            r#"(() => {{
                const root = {scope} ? document.querySelector({scope}) : document;
                if (!root) return null;
                let els = [];
                try {{ els = Array.from(root.querySelectorAll({candidates})); }} catch (e) {{ return null; }}
                els = els.filter(el => !el.disabled);
                for (const label of {labels}) {{
                    const needle = label.toLowerCase();
                    const el = els.find(el =>
                        (el.innerText || el.textContent || '').trim().toLowerCase().includes(needle) ||
                        (el.getAttribute('aria-label') || '').toLowerCase().includes(needle));
                    if (el) {{
                        const token = String(Date.now()) + Math.floor(Math.random() * 1e6);
                        el.setAttribute({attr}, token);
                        return '[' + {attr} + '="' + token + '"]';
                    }}
                }}
                return null;
            }})()"#,
            scope = scope.map(json_str).unwrap_or_else(|| "null".into()),
            candidates = json_str(candidates),
            labels = json_list(labels),
            attr = json_str(TARGET_ATTR),
        );
        Ok(self.page.evaluate(&js).await?)
    }

    /// Fill an input, replacing its content.
    pub async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.page.fill(selector, value).await?;
        Ok(())
    }

    /// Click through the DOM rather than synthesised mouse input, which
    /// survives overlays covering the element.
    pub async fn click(&self, selector: &str) -> Result<()> {
        let js = format!(
            r#"(() => {{
                const el = document.querySelector({});
                if (!el) return false;
                el.scrollIntoView({{ block: 'center' }});
                el.click();
                return true;
            }})()"#,
            json_str(selector)
        );
        let clicked: bool = self.page.evaluate(&js).await?;
        if clicked {
            Ok(())
        } else {
            Err(Error::NotFound(selector.to_string()))
        }
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}

fn json_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".into())
}

fn json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".into())
}
