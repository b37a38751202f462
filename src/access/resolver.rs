//! Connectivity resolver: tries access strategies in order until one
//! exposes the target page.

use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::browser::{BrowserError, PageControl};
use crate::report::{LogLevel, RunRecord};

use super::AccessStrategy;

/// Password field selectors, by name, type, and id
pub const PASSWORD_SELECTORS: &[&str] = &[
    "input[name='password']",
    "input[type='password']",
    "#id_password",
];

/// Signed-in markers across the locales the console renders in
pub const SIGNED_IN_MARKERS: &[&str] = &[
    "Log out",
    "Logout",
    "Sign out",
    "Déconnexion",
    "Se déconnecter",
    "Abmelden",
];

/// What the reachable predicate saw on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// A login form is present
    LoginForm,
    /// The session is already signed in
    Authenticated,
}

/// A strategy that worked, and what it exposed
#[derive(Debug, Clone)]
pub struct Reachable {
    pub strategy: String,
    pub state: PageState,
}

/// Settle periods per strategy class. Relay front-ends are slower than a
/// direct load and rarely reach a clean network idle, so they get a longer
/// fixed delay plus a bounded best-effort idle wait.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub direct_settle: Duration,
    pub relay_settle: Duration,
    pub idle_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            direct_settle: Duration::from_secs(2),
            relay_settle: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(10),
        }
    }
}

/// The reachable predicate: a visible password field means a login form,
/// otherwise a localized signed-in marker means an authenticated view.
pub async fn probe_page<P: PageControl + ?Sized>(
    page: &P,
) -> Result<Option<PageState>, BrowserError> {
    if page.first_visible(PASSWORD_SELECTORS).await?.is_some() {
        return Ok(Some(PageState::LoginForm));
    }
    if page.body_contains(SIGNED_IN_MARKERS).await? {
        return Ok(Some(PageState::Authenticated));
    }
    Ok(None)
}

/// Try each strategy in order until one exposes the target page. Strategy
/// faults are never fatal to the loop; they are logged on the record and
/// the next strategy is tried. `None` means every strategy, including
/// direct access, was exhausted.
pub async fn resolve<P: PageControl + ?Sized>(
    page: &P,
    target: &str,
    strategies: &[AccessStrategy],
    config: &ResolverConfig,
    record: &mut RunRecord,
) -> Option<Reachable> {
    for strategy in strategies {
        record.log(
            LogLevel::Step,
            &format!("Trying access path: {}", strategy.name()),
        );

        if let Err(e) = strategy.open(page, target).await {
            record.log(
                LogLevel::Warn,
                &format!("Access path {} failed: {}", strategy.name(), e),
            );
            continue;
        }

        if strategy.is_direct() {
            sleep(config.direct_settle).await;
        } else {
            sleep(config.relay_settle).await;
            if let Err(e) = page.wait_for_idle(config.idle_timeout).await {
                debug!("Idle wait after {} did not settle: {}", strategy.name(), e);
            }
        }

        match probe_page(page).await {
            Ok(Some(state)) => {
                record.log(
                    LogLevel::Success,
                    &format!("Target reachable via {}", strategy.name()),
                );
                return Some(Reachable {
                    strategy: strategy.name().to_string(),
                    state,
                });
            }
            Ok(None) => {
                record.log(
                    LogLevel::Warn,
                    &format!("Access path {} did not expose the target", strategy.name()),
                );
            }
            Err(e) => {
                record.log(
                    LogLevel::Warn,
                    &format!("Probe after {} failed: {}", strategy.name(), e),
                );
            }
        }
    }

    None
}
