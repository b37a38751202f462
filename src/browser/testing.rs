//! Scripted in-memory page used by unit tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{BrowserError, PageControl};

/// State changes applied when the scripted page sees a form submission
/// (a click on a submit control or an Enter press).
#[derive(Default)]
pub struct PostSubmit {
    pub url: Option<String>,
    pub show: Vec<String>,
    pub hide: Vec<String>,
    pub body: Option<String>,
}

/// A page whose behavior is scripted up front. Navigations to URLs
/// containing any `fail_url_contains` fragment fault; everything else is
/// recorded for assertions.
#[derive(Default)]
pub struct ScriptedPage {
    pub fail_url_contains: Vec<String>,
    pub fill_fails: bool,
    pub click_fails: bool,
    pub reload_fails: bool,

    pub url: Mutex<String>,
    pub body: Mutex<String>,
    pub visible: Mutex<HashSet<String>>,
    pub texts: Mutex<HashMap<String, String>>,
    pub post_submit: Mutex<Option<PostSubmit>>,

    pub nav_attempts: Mutex<Vec<String>>,
    pub fills: Mutex<Vec<(String, String)>>,
    pub clicks: Mutex<Vec<String>>,
    pub enter_presses: AtomicU32,
    pub shots: Mutex<Vec<PathBuf>>,
    pub reloads: AtomicU32,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&self, selector: &str) {
        self.visible.lock().unwrap().insert(selector.to_string());
    }

    pub fn hide(&self, selector: &str) {
        self.visible.lock().unwrap().remove(selector);
    }

    pub fn set_url(&self, url: &str) {
        *self.url.lock().unwrap() = url.to_string();
    }

    pub fn set_body(&self, body: &str) {
        *self.body.lock().unwrap() = body.to_string();
    }

    pub fn set_text(&self, selector: &str, text: &str) {
        self.texts
            .lock()
            .unwrap()
            .insert(selector.to_string(), text.to_string());
    }

    pub fn on_submit(&self, effect: PostSubmit) {
        *self.post_submit.lock().unwrap() = Some(effect);
    }

    fn apply_submit_effect(&self) {
        if let Some(effect) = self.post_submit.lock().unwrap().take() {
            if let Some(url) = effect.url {
                *self.url.lock().unwrap() = url;
            }
            if let Some(body) = effect.body {
                *self.body.lock().unwrap() = body;
            }
            let mut visible = self.visible.lock().unwrap();
            for s in effect.hide {
                visible.remove(&s);
            }
            for s in effect.show {
                visible.insert(s);
            }
        }
    }
}

#[async_trait]
impl PageControl for ScriptedPage {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.nav_attempts.lock().unwrap().push(url.to_string());

        if self.fail_url_contains.iter().any(|f| url.contains(f)) {
            return Err(BrowserError::NavigationFailed(format!(
                "scripted fault for {}",
                url
            )));
        }

        *self.url.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn wait_for_idle(&self, _timeout: Duration) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.url.lock().unwrap().clone())
    }

    async fn first_visible(&self, selectors: &[&str]) -> Result<Option<String>, BrowserError> {
        let visible = self.visible.lock().unwrap();
        Ok(selectors
            .iter()
            .find(|s| visible.contains(**s))
            .map(|s| s.to_string()))
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        if self.fill_fails {
            return Err(BrowserError::ElementNotFound(format!(
                "scripted fill fault for {}",
                selector
            )));
        }
        self.fills
            .lock()
            .unwrap()
            .push((selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        if self.click_fails {
            return Err(BrowserError::ElementNotFound(format!(
                "scripted click fault for {}",
                selector
            )));
        }
        self.clicks.lock().unwrap().push(selector.to_string());
        if selector.contains("submit") {
            self.apply_submit_effect();
        }
        Ok(())
    }

    async fn press_enter(&self) -> Result<(), BrowserError> {
        self.enter_presses.fetch_add(1, Ordering::Relaxed);
        self.apply_submit_effect();
        Ok(())
    }

    async fn element_text(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        Ok(self.texts.lock().unwrap().get(selector).cloned())
    }

    async fn body_contains(&self, needles: &[&str]) -> Result<bool, BrowserError> {
        let body = self.body.lock().unwrap();
        Ok(needles.iter().any(|n| body.contains(n)))
    }

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError> {
        self.shots.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    async fn reload(&self, _timeout: Duration) -> Result<(), BrowserError> {
        self.reloads.fetch_add(1, Ordering::Relaxed);
        if self.reload_fails {
            return Err(BrowserError::Timeout("scripted reload fault".to_string()));
        }
        Ok(())
    }
}
