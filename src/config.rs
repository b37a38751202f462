//! Runtime configuration: account sourcing and environment settings.
//!
//! Accounts come from two environment sources, in order: `ACCOUNTS_JSON`
//! (a JSON array of credential objects, or a single object) and the
//! `PANEL_USERNAME` / `PANEL_PASSWORD` pair. Malformed JSON is diagnosed
//! and ignored rather than aborting, so a partial configuration still runs
//! the accounts it can.

use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    pub password: String,
}

impl Account {
    /// An account with an empty username or password is kept in the run
    /// sequence so it gets a finalized failure report, but never reaches
    /// a browser.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

/// Parse `ACCOUNTS_JSON` content. Accepts a JSON array of credential
/// objects or a single object. Items missing either key are dropped with
/// a warning; a top-level parse failure drops the whole source.
pub fn parse_accounts_json(raw: &str) -> Vec<Account> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("ACCOUNTS_JSON is not valid JSON, ignoring it: {}", e);
            return Vec::new();
        }
    };

    let items = match value {
        serde_json::Value::Array(items) => items,
        obj @ serde_json::Value::Object(_) => vec![obj],
        other => {
            warn!(
                "ACCOUNTS_JSON must be a JSON array or object, got {}",
                type_name(&other)
            );
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value::<Account>(item) {
            Ok(account) => Some(account),
            Err(e) => {
                warn!("ACCOUNTS_JSON entry {} is malformed, skipping it: {}", i, e);
                None
            }
        })
        .collect()
}

fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Append the single-account pair to the accounts already sourced from
/// `ACCOUNTS_JSON`. The pair is only added when both halves are non-empty
/// and the username is not already present; an empty result means no
/// usable account configuration exists anywhere.
pub fn merge_env_pair(
    mut accounts: Vec<Account>,
    username: Option<String>,
    password: Option<String>,
) -> Vec<Account> {
    if let (Some(username), Some(password)) = (username, password) {
        if !username.is_empty()
            && !password.is_empty()
            && !accounts.iter().any(|a| a.username == username)
        {
            accounts.push(Account { username, password });
        }
    }
    accounts
}

/// Collect accounts from the environment. The `PANEL_USERNAME` /
/// `PANEL_PASSWORD` pair is appended only when both are set and the
/// username is not already present from `ACCOUNTS_JSON`.
pub fn load_accounts() -> Vec<Account> {
    let accounts = match env::var("ACCOUNTS_JSON") {
        Ok(raw) if !raw.trim().is_empty() => parse_accounts_json(&raw),
        _ => Vec::new(),
    };

    merge_env_pair(
        accounts,
        env::var("PANEL_USERNAME").ok(),
        env::var("PANEL_PASSWORD").ok(),
    )
}

const DEFAULT_TARGET_URL: &str = "https://admin.alwaysdata.com";

/// Interpret a `PANEL_HEADED` value. Unset means headless; so do the
/// usual falsy spellings, so `PANEL_HEADED=false` does not open a window.
fn headed_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

/// Run-wide settings, sourced from the environment with sane defaults
#[derive(Debug, Clone)]
pub struct Settings {
    /// Console base URL, without the login path
    pub target_url: String,
    pub headless: bool,
    /// Directory screenshots are written to
    pub artifact_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> Self {
        let target_url = env::var("PANEL_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .filter(|u| match url::Url::parse(u) {
                Ok(_) => true,
                Err(e) => {
                    warn!("PANEL_URL is not a valid URL ({}), using the default", e);
                    false
                }
            })
            .unwrap_or_else(|| DEFAULT_TARGET_URL.to_string());

        let headless = !env::var("PANEL_HEADED")
            .map(|v| headed_flag(&v))
            .unwrap_or(false);

        let artifact_dir = env::var("PANEL_ARTIFACT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir().join("panel-keeper").join("shots"));

        Self {
            target_url,
            headless,
            artifact_dir,
        }
    }

    /// The sign-in page, derived from the base URL
    pub fn login_url(&self) -> String {
        format!("{}/login/", self.target_url.trim_end_matches('/'))
    }
}
