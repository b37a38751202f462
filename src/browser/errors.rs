//! Browser error types

use thiserror::Error;

/// Browser-related errors
#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Script failed: {0}")]
    ScriptFailed(String),

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
