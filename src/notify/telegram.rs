//! Telegram Bot API notifier

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::Notify;

/// Telegram Bot API caption limit
const CAPTION_LIMIT: usize = 1024;

/// Telegram notification channel, configured from `TG_BOT_TOKEN` and
/// `TG_CHAT_ID`. Missing credentials leave it unconfigured and every send
/// becomes a no-op.
pub struct Telegram {
    token: String,
    chat_id: String,
    client: Option<reqwest::Client>,
}

impl Telegram {
    pub fn from_env() -> Self {
        let token = std::env::var("TG_BOT_TOKEN").unwrap_or_default();
        let chat_id = std::env::var("TG_CHAT_ID").unwrap_or_default();
        Self::new(token, chat_id)
    }

    pub fn new(token: String, chat_id: String) -> Self {
        let client = if token.is_empty() || chat_id.is_empty() {
            None
        } else {
            match reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
            {
                Ok(c) => Some(c),
                Err(e) => {
                    warn!("Failed to build Telegram HTTP client: {}", e);
                    None
                }
            }
        };

        Self {
            token,
            chat_id,
            client,
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.token, method)
    }
}

#[async_trait]
impl Notify for Telegram {
    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn send_text(&self, message: &str) {
        let Some(client) = &self.client else {
            return;
        };

        let result = client
            .post(self.api_url("sendMessage"))
            .form(&[
                ("chat_id", self.chat_id.as_str()),
                ("text", message),
                ("parse_mode", "HTML"),
            ])
            .send()
            .await;

        match result {
            Ok(resp) if !resp.status().is_success() => {
                warn!("Telegram sendMessage returned HTTP {}", resp.status());
            }
            Ok(_) => debug!("Telegram message sent"),
            Err(e) => warn!("Telegram sendMessage failed (non-fatal): {}", e),
        }
    }

    async fn send_photo(&self, path: &Path, caption: &str) {
        let Some(client) = &self.client else {
            return;
        };

        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) => {
                warn!("Cannot read artifact {}: {}", path.display(), e);
                return;
            }
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "artifact.png".to_string());

        let capped: String = caption.chars().take(CAPTION_LIMIT).collect();

        let part = match reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/png")
        {
            Ok(p) => p,
            Err(e) => {
                warn!("Cannot build photo part: {}", e);
                return;
            }
        };

        let form = reqwest::multipart::Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", capped)
            .part("photo", part);

        let result = client
            .post(self.api_url("sendPhoto"))
            .multipart(form)
            .send()
            .await;

        match result {
            Ok(resp) if !resp.status().is_success() => {
                warn!("Telegram sendPhoto returned HTTP {}", resp.status());
            }
            Ok(_) => debug!("Telegram photo sent: {}", path.display()),
            Err(e) => warn!("Telegram sendPhoto failed (non-fatal): {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_without_credentials() {
        assert!(!Telegram::new(String::new(), String::new()).is_configured());
        assert!(!Telegram::new("token".into(), String::new()).is_configured());
        assert!(!Telegram::new(String::new(), "42".into()).is_configured());
    }

    #[test]
    fn test_configured_with_credentials() {
        let tg = Telegram::new("token".into(), "42".into());
        assert!(tg.is_configured());
        assert_eq!(
            tg.api_url("sendMessage"),
            "https://api.telegram.org/bottoken/sendMessage"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_sends_are_noops() {
        let tg = Telegram::new(String::new(), String::new());
        // Must return without touching the network or panicking
        tg.send_text("hello").await;
        tg.send_photo(Path::new("/nonexistent.png"), "caption").await;
    }
}
