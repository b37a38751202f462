//! Outbound notification channel.
//!
//! The run never depends on delivery: every send is best-effort and an
//! unconfigured channel silently drops everything.

mod telegram;
#[cfg(test)]
pub mod testing;

use std::path::Path;

use async_trait::async_trait;

pub use telegram::Telegram;

/// A best-effort notification channel. Implementations must swallow their
/// own transport failures; callers never handle send errors.
#[async_trait]
pub trait Notify: Send + Sync {
    /// Whether the channel has usable credentials. When false, all sends
    /// must be no-ops.
    fn is_configured(&self) -> bool;

    async fn send_text(&self, message: &str);

    async fn send_photo(&self, path: &Path, caption: &str);
}
