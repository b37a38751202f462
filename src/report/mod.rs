//! Run reporting: masking, per-run records, and the notification sink.

mod mask;
mod record;
mod sink;

pub use mask::mask_identifier;
pub use record::{LogLevel, Outcome, RunRecord};
pub use sink::ReportingSink;
