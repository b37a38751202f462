//! Reporting sink: renders a run summary and forwards it to the notifier.

use chrono::Local;

use crate::notify::Notify;

use super::record::{Outcome, RunRecord};

/// Number of trailing log lines included in the summary. Telegram messages
/// have a hard size limit, so the tail trades completeness for delivery.
const LOG_TAIL: usize = 6;

/// At most this many screenshots are sent for a failed run
const MAX_FAILURE_PHOTOS: usize = 3;

/// Forwards one finalized [`RunRecord`] to the notification channel.
/// Everything here is best-effort: an unconfigured notifier skips all
/// sends, and transport failures are the notifier's problem.
pub struct ReportingSink<'a> {
    notifier: &'a dyn Notify,
}

impl<'a> ReportingSink<'a> {
    pub fn new(notifier: &'a dyn Notify) -> Self {
        Self { notifier }
    }

    /// Send the summary message and the selected artifacts for one run.
    pub async fn finalize(&self, record: &RunRecord) {
        if !self.notifier.is_configured() {
            return;
        }

        self.notifier.send_text(&render_summary(record)).await;

        if record.artifacts.is_empty() {
            return;
        }

        match record.outcome {
            // On failure the most recent shots carry the diagnostic value
            Outcome::Failure => {
                let start = record.artifacts.len().saturating_sub(MAX_FAILURE_PHOTOS);
                for shot in &record.artifacts[start..] {
                    let caption = shot
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    self.notifier.send_photo(shot, &caption).await;
                }
            }
            // On success one confirmation shot is enough
            Outcome::Success => {
                if let Some(last) = record.artifacts.last() {
                    self.notifier.send_photo(last, "completed").await;
                }
            }
        }
    }
}

fn render_summary(record: &RunRecord) -> String {
    let status = match record.outcome {
        Outcome::Success => "✅ Success",
        Outcome::Failure => "❌ Failure",
    };

    let mut msg = format!(
        "<b>🤖 Console sign-in keeper</b>\n\n\
         <b>Status:</b> {}\n\
         <b>User:</b> {}\n\
         <b>Time:</b> {}",
        status,
        record.masked_identifier,
        Local::now().format("%Y-%m-%d %H:%M:%S"),
    );

    if let Some(err) = &record.error {
        msg.push_str(&format!("\n<b>Error:</b> {}", err));
    }

    let start = record.lines.len().saturating_sub(LOG_TAIL);
    if start < record.lines.len() {
        msg.push_str("\n\n<b>Log:</b>\n");
        msg.push_str(&record.lines[start..].join("\n"));
    }

    msg
}
