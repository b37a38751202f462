//! In-memory notifier used by unit tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use super::Notify;

/// Records every send for assertions. Unconfigured by default, matching
/// the real channel's behavior without credentials.
#[derive(Default)]
pub struct MockNotifier {
    pub configured: bool,
    pub texts: Mutex<Vec<String>>,
    pub photos: Mutex<Vec<(PathBuf, String)>>,
}

impl MockNotifier {
    pub fn configured() -> Self {
        Self {
            configured: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Notify for MockNotifier {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn send_text(&self, message: &str) {
        self.texts.lock().unwrap().push(message.to_string());
    }

    async fn send_photo(&self, path: &Path, caption: &str) {
        self.photos
            .lock()
            .unwrap()
            .push((path.to_path_buf(), caption.to_string()));
    }
}
