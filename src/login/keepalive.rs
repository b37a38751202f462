//! Post-login keepalive probe.
//!
//! One reload pass over the authenticated page so the session registers
//! recent activity. Every fault in here is swallowed: by this point the
//! sign-in already succeeded and nothing the probe does may change that.

use std::time::Duration;

use tokio::time::sleep;

use crate::browser::PageControl;
use crate::report::{LogLevel, RunRecord};

#[derive(Debug, Clone)]
pub struct KeepAliveConfig {
    pub reload_timeout: Duration,
    pub idle_timeout: Duration,
    /// Settle before the closing screenshot
    pub settle: Duration,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            reload_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(15),
            settle: Duration::from_secs(2),
        }
    }
}

/// Reload the page and capture a closing artifact. Never fails.
pub async fn probe<P: PageControl + ?Sized>(
    page: &P,
    config: &KeepAliveConfig,
    record: &mut RunRecord,
) {
    record.log(LogLevel::Step, "Keepalive: refreshing session");

    if let Err(e) = page.reload(config.reload_timeout).await {
        record.log(
            LogLevel::Warn,
            &format!("Keepalive reload failed (non-fatal): {}", e),
        );
    }
    if let Err(e) = page.wait_for_idle(config.idle_timeout).await {
        tracing::debug!("Keepalive idle wait did not settle: {}", e);
    }

    record.log(LogLevel::Success, "Keepalive pass completed");
    sleep(config.settle).await;
    record.capture(page, "completed").await;
}
