//! Browser automation module
//!
//! Launches and controls one isolated Chrome/Chromium instance per account
//! run, exposed to the rest of the crate through the [`PageControl`] seam.

mod control;
mod errors;
mod session;

#[cfg(test)]
pub mod testing;

pub use control::PageControl;
pub use errors::BrowserError;
pub use session::{BrowserSession, BrowserSessionConfig};
