//! Sign-in flow: credential entry state machine and the post-login
//! keepalive probe.

pub mod keepalive;
pub mod machine;

pub use keepalive::KeepAliveConfig;
pub use machine::{LoginConfig, LoginOutcome, USERNAME_SELECTORS};
