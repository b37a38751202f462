//! Run orchestration: one isolated browser session per account, sequential
//! processing, and exactly one finalized report per account no matter how
//! the run ends.

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::access::{self, AccessStrategy, ResolverConfig};
use crate::browser::{BrowserError, BrowserSession, BrowserSessionConfig, PageControl};
use crate::config::{Account, Settings};
use crate::login::{keepalive, machine, KeepAliveConfig, LoginConfig, LoginOutcome};
use crate::notify::Notify;
use crate::report::{LogLevel, Outcome, ReportingSink, RunRecord};

/// Aggregate outcome counts for the whole run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunTotals {
    pub succeeded: usize,
    pub failed: usize,
}

/// Tunables for one account's drive, grouped so tests can shrink every
/// wait at once.
#[derive(Debug, Clone, Default)]
pub struct DriveConfig {
    pub resolver: ResolverConfig,
    pub login: LoginConfig,
    pub keepalive: KeepAliveConfig,
}

/// Process every account in order. Each account gets a fresh browser
/// session that is always released, and its record is finalized through
/// the sink exactly once, whatever happened inside the run.
pub async fn run(settings: &Settings, notifier: &dyn Notify, accounts: &[Account]) -> RunTotals {
    let mut totals = RunTotals::default();
    let sink = ReportingSink::new(notifier);
    let drive_config = DriveConfig::default();

    for (i, account) in accounts.iter().enumerate() {
        let index = i + 1;
        let mut record = RunRecord::new(index, &account.username, &settings.artifact_dir);
        info!(
            "[{}/{}] Processing account {}",
            index,
            accounts.len(),
            record.masked_identifier
        );

        if !account.is_complete() {
            record.log(LogLevel::Error, "Credentials incomplete, skipping sign-in");
            record.mark_failure("username or password not configured");
        } else {
            run_account(settings, account, index, &drive_config, &mut record).await;
        }

        match record.outcome {
            Outcome::Success => totals.succeeded += 1,
            Outcome::Failure => totals.failed += 1,
        }

        sink.finalize(&record).await;

        if record.outcome == Outcome::Success && index < accounts.len() {
            let delay = {
                let mut rng = rand::thread_rng();
                Duration::from_millis(rng.gen_range(2000..6000))
            };
            info!("Pacing {}ms before the next account", delay.as_millis());
            sleep(delay).await;
        }
    }

    totals
}

/// One account against one fresh browser session. Launch faults become a
/// recorded failure; the session is released on every path out.
async fn run_account(
    settings: &Settings,
    account: &Account,
    index: usize,
    config: &DriveConfig,
    record: &mut RunRecord,
) {
    if let Err(e) = std::fs::create_dir_all(&settings.artifact_dir) {
        warn!("Could not create artifact directory: {}", e);
    }

    let session_config = BrowserSessionConfig::for_run(index).headless(settings.headless);
    let session = match BrowserSession::new(index, session_config).await {
        Ok(session) => session,
        Err(e) => {
            record.log(LogLevel::Error, &format!("Browser launch failed: {}", e));
            record.mark_failure("browser launch failed");
            return;
        }
    };

    let strategies = {
        let mut rng = rand::thread_rng();
        AccessStrategy::run_order(&mut rng)
    };

    let result = drive(
        &session,
        account,
        &settings.login_url(),
        &strategies,
        config,
        record,
    )
    .await;

    if let Err(e) = session.close().await {
        warn!("Browser session release failed: {}", e);
    }

    if let Err(e) = result {
        record.log(LogLevel::Error, &format!("Unexpected fault: {}", e));
        record.mark_failure(&format!("unexpected fault: {}", e));
    }
}

/// The full per-account flow over an already-launched page: resolve an
/// access path, run the sign-in machine, then the keepalive probe. Returns
/// the outcome it marked on the record; `Err` is reserved for engine-level
/// faults the caller reports.
pub async fn drive<P: PageControl + ?Sized>(
    page: &P,
    account: &Account,
    target: &str,
    strategies: &[AccessStrategy],
    config: &DriveConfig,
    record: &mut RunRecord,
) -> Result<Outcome, BrowserError> {
    let reachable = match access::resolve(page, target, strategies, &config.resolver, record).await
    {
        Some(reachable) => reachable,
        None => {
            record.log(LogLevel::Error, "Target unreachable via any access path");
            record.mark_failure("target unreachable via any access path");
            return Ok(Outcome::Failure);
        }
    };
    record.capture(page, "reachable").await;

    match machine::run(page, account, reachable.state, &config.login, record).await? {
        LoginOutcome::Rejected { reason } => {
            record.mark_failure(&reason);
            Ok(Outcome::Failure)
        }
        LoginOutcome::Authenticated => {
            keepalive::probe(page, &config.keepalive, record).await;
            record.mark_success();
            Ok(Outcome::Success)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::browser::testing::{PostSubmit, ScriptedPage};
    use crate::notify::testing::MockNotifier;

    fn fast_config() -> DriveConfig {
        DriveConfig {
            resolver: ResolverConfig {
                direct_settle: Duration::from_millis(1),
                relay_settle: Duration::from_millis(1),
                idle_timeout: Duration::from_millis(1),
            },
            login: LoginConfig {
                submit_timeout: Duration::from_millis(5),
                settle: Duration::from_millis(1),
                poll: Duration::from_millis(1),
                ..Default::default()
            },
            keepalive: KeepAliveConfig {
                reload_timeout: Duration::from_millis(1),
                idle_timeout: Duration::from_millis(1),
                settle: Duration::from_millis(1),
            },
        }
    }

    fn account() -> Account {
        Account {
            username: "a@x.com".to_string(),
            password: "p1".to_string(),
        }
    }

    fn settings() -> Settings {
        Settings {
            target_url: "https://target.example".to_string(),
            headless: true,
            artifact_dir: PathBuf::from("."),
        }
    }

    #[tokio::test]
    async fn test_incomplete_account_fails_without_browser_work() {
        let notifier = MockNotifier::configured();
        let accounts = vec![Account {
            username: "a@x.com".to_string(),
            password: String::new(),
        }];

        let totals = run(&settings(), &notifier, &accounts).await;

        assert_eq!(totals, RunTotals { succeeded: 0, failed: 1 });
        // Exactly one finalize: one summary text went out
        assert_eq!(notifier.texts.lock().unwrap().len(), 1);
        assert!(notifier.photos.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drive_succeeds_end_to_end() {
        let page = ScriptedPage {
            // Every relay front-end faults, leaving direct access
            fail_url_contains: vec![
                "allorigins".to_string(),
                "codetabs".to_string(),
                "corsproxy".to_string(),
                "croxyproxy".to_string(),
            ],
            ..ScriptedPage::new()
        };
        page.show("input[name='email']");
        page.show("input[name='password']");
        page.show("button[type='submit'], input[type='submit']");
        page.on_submit(PostSubmit {
            url: Some("https://target.example/dashboard/".to_string()),
            hide: vec![
                "input[name='password']".to_string(),
                "input[name='email']".to_string(),
            ],
            ..Default::default()
        });

        let strategies = {
            let mut rng = rand::thread_rng();
            AccessStrategy::run_order(&mut rng)
        };
        let mut record = RunRecord::new(1, "a@x.com", &PathBuf::from("."));

        let outcome = drive(
            &page,
            &account(),
            "https://target.example/login/",
            &strategies,
            &fast_config(),
            &mut record,
        )
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::Success);
        assert_eq!(record.outcome, Outcome::Success);
        // The keepalive closing shot is the last artifact
        assert!(record
            .artifacts
            .last()
            .is_some_and(|p| p.to_string_lossy().ends_with("_completed.png")));
    }

    #[tokio::test]
    async fn test_drive_unreachable_target_fails() {
        let page = ScriptedPage {
            fail_url_contains: vec!["".to_string()],
            ..ScriptedPage::new()
        };

        let strategies = AccessStrategy::catalog()
            .into_iter()
            .chain(std::iter::once(AccessStrategy::Direct))
            .collect::<Vec<_>>();
        let mut record = RunRecord::new(1, "a@x.com", &PathBuf::from("."));

        let outcome = drive(
            &page,
            &account(),
            "https://target.example/login/",
            &strategies,
            &fast_config(),
            &mut record,
        )
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::Failure);
        assert_eq!(
            record.error.as_deref(),
            Some("target unreachable via any access path")
        );
        assert!(record.artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_drive_rejected_login_fails_with_reason() {
        let page = ScriptedPage::new();
        page.set_url("https://target.example/login/");
        page.show("input[name='email']");
        page.show("input[name='password']");
        page.show("button[type='submit'], input[type='submit']");
        // Submission leaves the login form in place
        page.on_submit(PostSubmit::default());

        let strategies = vec![AccessStrategy::Direct];
        let mut record = RunRecord::new(1, "a@x.com", &PathBuf::from("."));

        let outcome = drive(
            &page,
            &account(),
            "https://target.example/login/",
            &strategies,
            &fast_config(),
            &mut record,
        )
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::Failure);
        assert!(record.error.is_some());
    }
}
