//! Browser session management
//!
//! Handles launching and controlling one isolated Chrome browser instance
//! per account run. Each session gets its own user data directory so that
//! cookies and state never leak between accounts.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{BrowserError, PageControl};

/// Find Chrome/Chromium executable on the system
fn find_chrome() -> Option<std::path::PathBuf> {
    let candidates: Vec<std::path::PathBuf> = if cfg!(target_os = "windows") {
        let mut paths = vec![
            std::path::PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
            std::path::PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
        ];
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            paths.push(std::path::PathBuf::from(format!(
                r"{}\Google\Chrome\Application\chrome.exe",
                local
            )));
        }
        paths
    } else if cfg!(target_os = "macos") {
        vec![std::path::PathBuf::from(
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        )]
    } else {
        vec![
            std::path::PathBuf::from("/usr/bin/chromium"),
            std::path::PathBuf::from("/usr/bin/chromium-browser"),
            std::path::PathBuf::from("/usr/bin/google-chrome"),
            std::path::PathBuf::from("/usr/bin/google-chrome-stable"),
        ]
    };

    candidates.into_iter().find(|p| p.exists())
}

/// Configuration for a browser session
#[derive(Debug, Clone)]
pub struct BrowserSessionConfig {
    /// Path to Chrome/Chromium executable
    pub chrome_path: Option<String>,
    /// Run in headless mode
    pub headless: bool,
    /// User data directory
    pub user_data_dir: Option<String>,
    /// Navigation timeout in seconds
    pub timeout_secs: u64,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
}

impl Default for BrowserSessionConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            user_data_dir: None,
            timeout_secs: 60,
            window_width: 1920,
            window_height: 1080,
        }
    }
}

impl BrowserSessionConfig {
    /// Create config for one account run with an isolated data directory
    pub fn for_run(run_index: usize) -> Self {
        let base = std::env::temp_dir().join("panel-keeper").join("browser_data");
        let dir = base.join(format!("run{}-{}", run_index, uuid::Uuid::new_v4()));

        Self {
            user_data_dir: Some(dir.to_string_lossy().to_string()),
            ..Default::default()
        }
    }

    /// Set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }
}

/// An isolated browser session for one account run
pub struct BrowserSession {
    /// Display name, e.g. "run-1"
    pub id: String,
    /// The browser instance
    browser: Arc<RwLock<Option<Browser>>>,
    /// The single page this session drives
    page: Arc<RwLock<Option<Page>>>,
    /// Session configuration
    config: BrowserSessionConfig,
    /// Whether the session is alive
    alive: Arc<AtomicBool>,
}

impl BrowserSession {
    /// Launch a new browser session with the given config
    pub async fn new(run_index: usize, config: BrowserSessionConfig) -> Result<Self, BrowserError> {
        let session_id = format!("run-{}", run_index);

        info!(
            "Launching browser session {} (headless: {})",
            session_id, config.headless
        );

        if config.chrome_path.is_none() && find_chrome().is_none() {
            return Err(BrowserError::LaunchFailed(
                "Chrome/Chromium not found. Install it and retry.".to_string(),
            ));
        }

        let mut builder = BrowserConfig::builder();

        // BrowserConfig defaults to headless; only opt out for headed runs
        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        } else if let Some(chrome_path) = find_chrome() {
            info!("Auto-detected Chrome at: {}", chrome_path.display());
            builder = builder.chrome_executable(chrome_path);
        }

        if let Some(ref dir) = config.user_data_dir {
            let _ = std::fs::create_dir_all(dir);
            builder = builder.user_data_dir(dir);
        }

        builder = builder
            .window_size(config.window_width, config.window_height)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-notifications")
            .arg("--disable-save-password-bubble")
            .arg("--disable-dev-shm-usage")
            // Required when running as root (e.g., in Docker or on a VPS)
            .arg("--no-sandbox");

        let browser_config = builder
            .build()
            .map_err(BrowserError::LaunchFailed)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        // Spawn handler in background; when the stream ends, Chrome has
        // disconnected or crashed.
        let session_id_clone = session_id.clone();
        let alive_flag = Arc::new(AtomicBool::new(true));
        let alive_for_handler = alive_flag.clone();
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Session {} CDP handler error: {}", session_id_clone, e);
                }
            }
            warn!(
                "Session {} Chrome disconnected (event handler ended)",
                session_id_clone
            );
            alive_for_handler.store(false, Ordering::Relaxed);
        });

        // Chrome opens with a blank tab; take it as our page and close extras
        let page = {
            let mut pages = browser
                .pages()
                .await
                .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

            let main_page = if !pages.is_empty() {
                pages.remove(0)
            } else {
                browser
                    .new_page("about:blank")
                    .await
                    .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?
            };

            for extra_page in pages {
                debug!("Closing extra blank tab");
                let _ = extra_page.close().await;
            }

            main_page
        };

        info!("Browser session {} created", session_id);

        Ok(Self {
            id: session_id,
            browser: Arc::new(RwLock::new(Some(browser))),
            page: Arc::new(RwLock::new(Some(page))),
            config,
            alive: alive_flag,
        })
    }

    /// Fetch the live page handle. Fails fast once the CDP handler has
    /// observed a Chrome disconnect, so callers get `ConnectionLost`
    /// instead of hanging on a dead socket.
    async fn with_page(&self) -> Result<Page, BrowserError> {
        if !self.alive.load(Ordering::Relaxed) {
            return Err(BrowserError::ConnectionLost(
                "Browser disconnected".into(),
            ));
        }
        let page = self.page.read().await;
        page.as_ref()
            .cloned()
            .ok_or_else(|| BrowserError::ConnectionLost("No active page".into()))
    }

    /// Close the browser session
    pub async fn close(&self) -> Result<(), BrowserError> {
        // Mark as not alive first to prevent new operations
        self.alive.store(false, Ordering::Relaxed);

        {
            let mut page = self.page.write().await;
            if let Some(p) = page.take() {
                let _ = p.close().await;
            }
        }

        // Graceful close first, brief grace period, then force kill so no
        // Chrome child processes linger
        {
            let mut browser = self.browser.write().await;
            if let Some(mut b) = browser.take() {
                let _ = b.close().await;
                tokio::time::sleep(Duration::from_millis(500)).await;
                let _ = b.kill().await;
            }
        }

        info!("Browser session {} closed", self.id);
        Ok(())
    }
}

#[async_trait]
impl PageControl for BrowserSession {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        let page = self.with_page().await?;

        debug!("Session {} navigating to: {}", self.id, url);
        tokio::time::timeout(Duration::from_secs(self.config.timeout_secs), page.goto(url))
            .await
            .map_err(|_| BrowserError::Timeout(format!("Navigation to {} timed out", url)))?
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;

        Ok(())
    }

    async fn wait_for_idle(&self, timeout: Duration) -> Result<(), BrowserError> {
        let page = self.with_page().await?;

        tokio::time::timeout(timeout, page.wait_for_navigation())
            .await
            .map_err(|_| BrowserError::Timeout("Idle wait timed out".into()))?
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;

        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let page = self.with_page().await?;

        page.url()
            .await
            .map_err(|e| BrowserError::ConnectionLost(e.to_string()))?
            .ok_or_else(|| BrowserError::ConnectionLost("No URL".into()))
    }

    async fn first_visible(&self, selectors: &[&str]) -> Result<Option<String>, BrowserError> {
        let page = self.with_page().await?;

        let script = format!(
            r#"
            (function() {{
                const sels = {};
                for (const s of sels) {{
                    let el;
                    try {{ el = document.querySelector(s); }} catch (e) {{ continue; }}
                    if (!el) continue;
                    const style = window.getComputedStyle(el);
                    if (style.display === 'none' || style.visibility === 'hidden') continue;
                    const rect = el.getBoundingClientRect();
                    if (rect.width > 0 && rect.height > 0) return s;
                }}
                return "";
            }})()
            "#,
            serde_json::to_string(selectors)
                .map_err(|e| BrowserError::ScriptFailed(e.to_string()))?
        );

        let found: String = page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::ScriptFailed(e.to_string()))?
            .into_value()
            .map_err(|e| BrowserError::ScriptFailed(e.to_string()))?;

        Ok(if found.is_empty() { None } else { Some(found) })
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        let page = self.with_page().await?;

        let element = page
            .find_element(selector)
            .await
            .map_err(|e| BrowserError::ElementNotFound(format!("{}: {}", selector, e)))?;

        element
            .click()
            .await
            .map_err(|e| BrowserError::ScriptFailed(format!("focus {}: {}", selector, e)))?;
        element
            .type_str(value)
            .await
            .map_err(|e| BrowserError::ScriptFailed(format!("type into {}: {}", selector, e)))?;

        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        let page = self.with_page().await?;

        let element = page
            .find_element(selector)
            .await
            .map_err(|e| BrowserError::ElementNotFound(format!("{}: {}", selector, e)))?;

        element
            .click()
            .await
            .map_err(|e| BrowserError::ScriptFailed(format!("click {}: {}", selector, e)))?;

        Ok(())
    }

    async fn press_enter(&self) -> Result<(), BrowserError> {
        let page = self.with_page().await?;

        // rawKeyDown + char '\r' + keyUp triggers form submission the same
        // way a physical Enter press does
        let key_down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::RawKeyDown)
            .key("Enter")
            .code("Enter")
            .windows_virtual_key_code(13)
            .native_virtual_key_code(13)
            .build()
            .map_err(BrowserError::ScriptFailed)?;
        page.execute(key_down)
            .await
            .map_err(|e| BrowserError::ScriptFailed(format!("Enter keyDown failed: {}", e)))?;

        let char_event = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::Char)
            .text("\r")
            .build()
            .map_err(BrowserError::ScriptFailed)?;
        page.execute(char_event)
            .await
            .map_err(|e| BrowserError::ScriptFailed(format!("Enter char failed: {}", e)))?;

        let key_up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .key("Enter")
            .code("Enter")
            .windows_virtual_key_code(13)
            .native_virtual_key_code(13)
            .build()
            .map_err(BrowserError::ScriptFailed)?;
        page.execute(key_up)
            .await
            .map_err(|e| BrowserError::ScriptFailed(format!("Enter keyUp failed: {}", e)))?;

        Ok(())
    }

    async fn element_text(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        let page = self.with_page().await?;

        let element = match page.find_element(selector).await {
            Ok(el) => el,
            Err(_) => return Ok(None),
        };

        element
            .inner_text()
            .await
            .map_err(|e| BrowserError::ScriptFailed(e.to_string()))
    }

    async fn body_contains(&self, needles: &[&str]) -> Result<bool, BrowserError> {
        let page = self.with_page().await?;

        let script = format!(
            r#"
            (function() {{
                const needles = {};
                const text = document.body ? document.body.innerText : '';
                return needles.some(n => text.includes(n));
            }})()
            "#,
            serde_json::to_string(needles)
                .map_err(|e| BrowserError::ScriptFailed(e.to_string()))?
        );

        page.evaluate(script)
            .await
            .map_err(|e| BrowserError::ScriptFailed(e.to_string()))?
            .into_value()
            .map_err(|e| BrowserError::ScriptFailed(e.to_string()))
    }

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError> {
        let page = self.with_page().await?;

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();

        page.save_screenshot(params, path)
            .await
            .map_err(|e| BrowserError::ScreenshotFailed(e.to_string()))?;

        Ok(())
    }

    async fn reload(&self, timeout: Duration) -> Result<(), BrowserError> {
        let page = self.with_page().await?;

        tokio::time::timeout(timeout, page.reload())
            .await
            .map_err(|_| BrowserError::Timeout("Reload timed out".into()))?
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;

        Ok(())
    }
}
