//! Per-run record of log lines, artifacts, and outcome.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::browser::PageControl;

use super::mask::mask_identifier;

/// Log line severity, rendered as a glyph prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Error,
    Warn,
    Step,
}

impl LogLevel {
    fn glyph(self) -> &'static str {
        match self {
            LogLevel::Info => "ℹ️",
            LogLevel::Success => "✅",
            LogLevel::Error => "❌",
            LogLevel::Warn => "⚠️",
            LogLevel::Step => "🔹",
        }
    }
}

/// Final outcome of one account run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// Accumulated state for one account's run: masked identity, ordered log
/// lines, captured artifacts, and the final outcome. Created at run start,
/// finalized through the reporting sink exactly once at run end.
pub struct RunRecord {
    /// 1-based account index, used in artifact file names
    pub index: usize,
    /// Masked account identifier; the raw identifier is never stored
    pub masked_identifier: String,
    /// Ordered log lines for the notification tail
    pub lines: Vec<String>,
    /// Paths of successfully captured screenshots, in capture order
    pub artifacts: Vec<PathBuf>,
    pub outcome: Outcome,
    pub error: Option<String>,
    artifact_dir: PathBuf,
    seq: u32,
}

impl RunRecord {
    pub fn new(index: usize, identifier: &str, artifact_dir: &Path) -> Self {
        Self {
            index,
            masked_identifier: mask_identifier(identifier),
            lines: Vec::new(),
            artifacts: Vec::new(),
            outcome: Outcome::Failure,
            error: None,
            artifact_dir: artifact_dir.to_path_buf(),
            seq: 0,
        }
    }

    /// Append a log line and mirror it to tracing
    pub fn log(&mut self, level: LogLevel, msg: &str) {
        let line = format!("{} [{}] {}", level.glyph(), self.masked_identifier, msg);
        match level {
            LogLevel::Error => error!("{}", line),
            LogLevel::Warn => warn!("{}", line),
            _ => info!("{}", line),
        }
        self.lines.push(line);
    }

    /// Capture a screenshot tagged with `tag`. Best-effort: a capture fault
    /// is logged and swallowed, and the path is only recorded on success.
    /// Sequence numbers advance even for failed captures so they stay
    /// strictly increasing within the run.
    pub async fn capture<P: PageControl + ?Sized>(&mut self, page: &P, tag: &str) {
        self.seq += 1;
        let name = format!("{}_{:02}_{}.png", self.index, self.seq, tag);
        let path = self.artifact_dir.join(name);

        match page.screenshot(&path).await {
            Ok(()) => self.artifacts.push(path),
            Err(e) => warn!(
                "[{}] screenshot '{}' failed (non-fatal): {}",
                self.masked_identifier, tag, e
            ),
        }
    }

    pub fn mark_success(&mut self) {
        self.outcome = Outcome::Success;
        self.error = None;
    }

    pub fn mark_failure(&mut self, reason: &str) {
        self.outcome = Outcome::Failure;
        if !reason.is_empty() {
            self.error = Some(reason.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::ScriptedPage;

    #[test]
    fn test_record_masks_identifier() {
        let mut record = RunRecord::new(1, "john.doe@example.com", Path::new("."));
        record.log(LogLevel::Info, "starting");

        assert_eq!(record.masked_identifier, "j***e@e***e.com");
        assert!(!record.lines[0].contains("john.doe@example.com"));
        assert!(record.lines[0].contains("j***e@e***e.com"));
    }

    #[tokio::test]
    async fn test_capture_sequence_numbers_increase() {
        let page = ScriptedPage::new();
        let mut record = RunRecord::new(2, "a@x.com", Path::new("/tmp"));

        record.capture(&page, "filled").await;
        record.capture(&page, "submitted").await;

        assert_eq!(record.artifacts.len(), 2);
        assert!(record.artifacts[0].ends_with("2_01_filled.png"));
        assert!(record.artifacts[1].ends_with("2_02_submitted.png"));
    }

    #[test]
    fn test_outcome_marking() {
        let mut record = RunRecord::new(1, "a@x.com", Path::new("."));
        assert_eq!(record.outcome, Outcome::Failure);

        record.mark_failure("sign-in rejected");
        assert_eq!(record.error.as_deref(), Some("sign-in rejected"));

        record.mark_success();
        assert_eq!(record.outcome, Outcome::Success);
        assert!(record.error.is_none());
    }
}
