//! Login state machine.
//!
//! Drives `Unauthenticated → CredentialsEntered → Submitted →
//! {Authenticated, Rejected}` over a page the resolver already proved
//! reachable. Field location is a ranked visible-selector dispatch with a
//! guaranteed default, so an attempt is always made even against unknown
//! markup. No transition is retried; a failed run is simply recorded.

use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::access::{probe_page, PageState, PASSWORD_SELECTORS};
use crate::browser::{BrowserError, PageControl};
use crate::config::Account;
use crate::report::{LogLevel, RunRecord};

/// Username field selectors, most specific first
pub const USERNAME_SELECTORS: &[&str] = &[
    "input[name='email']",
    "input[name='username']",
    "input[type='email']",
    "#id_email",
];

const DEFAULT_USERNAME_SELECTOR: &str = "input[name='email']";
const DEFAULT_PASSWORD_SELECTOR: &str = "input[name='password']";

const SUBMIT_SELECTOR: &str = "button[type='submit'], input[type='submit']";

/// Best-effort source for a rejection reason
const ERROR_SELECTOR: &str = ".alert-danger, .error, [role='alert']";

/// Terminal states of the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated,
    Rejected { reason: String },
}

#[derive(Debug, Clone)]
pub struct LoginConfig {
    /// Bound on the post-submit wait for the URL to leave the login page
    pub submit_timeout: Duration,
    /// Fixed settle after the post-submit wait
    pub settle: Duration,
    /// Poll interval for the post-submit URL check
    pub poll: Duration,
    /// URL substring that marks the login page
    pub login_indicator: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            submit_timeout: Duration::from_secs(30),
            settle: Duration::from_secs(2),
            poll: Duration::from_millis(500),
            login_indicator: "login".to_string(),
        }
    }
}

/// Run the state machine to a terminal state. `initial` comes from the
/// resolver; an already-authenticated page skips credential entry
/// entirely. Only engine-level faults propagate; interaction faults
/// terminate in `Rejected`.
pub async fn run<P: PageControl + ?Sized>(
    page: &P,
    account: &Account,
    initial: PageState,
    config: &LoginConfig,
    record: &mut RunRecord,
) -> Result<LoginOutcome, BrowserError> {
    if initial == PageState::Authenticated {
        record.log(LogLevel::Success, "Already signed in");
        record.capture(page, "already_authenticated").await;
        return Ok(LoginOutcome::Authenticated);
    }

    // Unauthenticated -> CredentialsEntered
    record.log(LogLevel::Step, "Entering credentials");

    let username_sel = match page.first_visible(USERNAME_SELECTORS).await {
        Ok(Some(sel)) => sel,
        _ => {
            record.log(
                LogLevel::Warn,
                &format!(
                    "No obvious username field, falling back to {}",
                    DEFAULT_USERNAME_SELECTOR
                ),
            );
            DEFAULT_USERNAME_SELECTOR.to_string()
        }
    };

    if let Err(e) = page.fill(&username_sel, &account.username).await {
        return reject_on_input_fault(page, record, e).await;
    }

    let password_sel = match page.first_visible(PASSWORD_SELECTORS).await {
        Ok(Some(sel)) => sel,
        _ => DEFAULT_PASSWORD_SELECTOR.to_string(),
    };

    if let Err(e) = page.fill(&password_sel, &account.password).await {
        return reject_on_input_fault(page, record, e).await;
    }

    record.log(LogLevel::Info, "Credentials entered");
    record.capture(page, "filled").await;

    // CredentialsEntered -> Submitted
    record.log(LogLevel::Step, "Submitting sign-in form");

    let clicked = match page.first_visible(&[SUBMIT_SELECTOR]).await {
        Ok(Some(sel)) => page.click(&sel).await.is_ok(),
        _ => false,
    };
    if !clicked {
        record.log(LogLevel::Warn, "Submit control not clickable, sending Enter");
        page.press_enter().await?;
    }

    // Wait for the URL to move off the login page; a dirty transition is
    // not itself a failure, verification below decides the outcome
    let deadline = Instant::now() + config.submit_timeout;
    let mut transitioned = false;
    loop {
        if let Ok(url) = page.current_url().await {
            if !url.contains(&config.login_indicator) {
                transitioned = true;
                break;
            }
        }
        if Instant::now() >= deadline {
            break;
        }
        sleep(config.poll).await;
    }

    if !transitioned {
        record.log(
            LogLevel::Warn,
            "No clean transition away from the sign-in page",
        );
        if let Err(e) = page.wait_for_idle(config.submit_timeout).await {
            tracing::debug!("Post-submit idle wait did not settle: {}", e);
        }
    }
    sleep(config.settle).await;
    record.capture(page, "submitted").await;

    // Submitted -> Authenticated | Rejected
    record.log(LogLevel::Step, "Verifying sign-in");

    match probe_page(page).await? {
        Some(PageState::LoginForm) => {
            let reason = rejection_reason(page).await;
            record.log(LogLevel::Error, &format!("Sign-in rejected: {}", reason));
            record.capture(page, "login_fail").await;
            Ok(LoginOutcome::Rejected { reason })
        }
        _ => {
            record.log(LogLevel::Success, "Signed in");
            record.capture(page, "login_ok").await;
            Ok(LoginOutcome::Authenticated)
        }
    }
}

async fn reject_on_input_fault<P: PageControl + ?Sized>(
    page: &P,
    record: &mut RunRecord,
    fault: BrowserError,
) -> Result<LoginOutcome, BrowserError> {
    record.log(LogLevel::Error, &format!("Credential input failed: {}", fault));
    record.capture(page, "input_fail").await;
    Ok(LoginOutcome::Rejected {
        reason: format!("input failure: {}", fault),
    })
}

async fn rejection_reason<P: PageControl + ?Sized>(page: &P) -> String {
    page.element_text(ERROR_SELECTOR)
        .await
        .ok()
        .flatten()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "password form still present after submit".to_string())
}
