//! Page control seam between the automation logic and the browser engine.
//!
//! The resolver, login state machine, and keepalive probe only talk to this
//! trait, so they can be exercised against a scripted page in tests while
//! production runs go through the chromiumoxide-backed [`BrowserSession`].
//!
//! [`BrowserSession`]: super::BrowserSession

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use super::BrowserError;

/// Control surface over one live page in an isolated browsing context.
#[async_trait]
pub trait PageControl: Send + Sync {
    /// Navigate the page to `url` and wait for the load to settle.
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    /// Best-effort wait for network idleness, bounded by `timeout`.
    async fn wait_for_idle(&self, timeout: Duration) -> Result<(), BrowserError>;

    /// Current page URL.
    async fn current_url(&self) -> Result<String, BrowserError>;

    /// First selector from `selectors` that matches a currently visible
    /// element, in rank order. `None` when nothing matches.
    async fn first_visible(&self, selectors: &[&str]) -> Result<Option<String>, BrowserError>;

    /// Focus the element at `selector` and type `value` into it.
    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError>;

    /// Click the element at `selector`.
    async fn click(&self, selector: &str) -> Result<(), BrowserError>;

    /// Send an Enter key press to the focused element.
    async fn press_enter(&self) -> Result<(), BrowserError>;

    /// Inner text of the first element matching `selector`, if any.
    async fn element_text(&self, selector: &str) -> Result<Option<String>, BrowserError>;

    /// Whether the page body text contains any of `needles`.
    async fn body_contains(&self, needles: &[&str]) -> Result<bool, BrowserError>;

    /// Capture a PNG screenshot of the viewport to `path`.
    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError>;

    /// Reload the current page, bounded by `timeout`.
    async fn reload(&self, timeout: Duration) -> Result<(), BrowserError>;
}
