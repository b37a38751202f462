//! Access strategy catalog.
//!
//! Each strategy is one way of reaching the target page: through a relay
//! web front-end that fetches the URL for us, or directly. A new access
//! path is a new variant, never a branch inside shared code.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::browser::{BrowserError, PageControl};

/// One way of moving a session to the target page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessStrategy {
    /// Relay that takes the target as a URL query parameter
    UrlRelay {
        name: &'static str,
        prefix: &'static str,
    },
    /// Relay front-end where the target URL is typed into a form
    FormRelay {
        name: &'static str,
        entry: &'static str,
        input: &'static str,
        submit: &'static str,
    },
    /// Plain navigation; always attempted last
    Direct,
}

impl AccessStrategy {
    /// The fixed relay catalog, without `Direct`
    pub fn catalog() -> Vec<AccessStrategy> {
        vec![
            AccessStrategy::UrlRelay {
                name: "allorigins",
                prefix: "https://api.allorigins.win/raw?url=",
            },
            AccessStrategy::UrlRelay {
                name: "codetabs",
                prefix: "https://api.codetabs.com/v1/proxy?quest=",
            },
            AccessStrategy::UrlRelay {
                name: "corsproxy",
                prefix: "https://corsproxy.io/?url=",
            },
            AccessStrategy::FormRelay {
                name: "croxyproxy",
                entry: "https://www.croxyproxy.com/",
                input: "input#url",
                submit: "#requestSubmit",
            },
        ]
    }

    /// Attempt order for one run: relays shuffled, `Direct` pinned last.
    /// Shuffling spreads load across relays; direct access is the cheapest
    /// success path but the most likely to be blocked, so it closes the
    /// list instead of opening it.
    pub fn run_order<R: Rng + ?Sized>(rng: &mut R) -> Vec<AccessStrategy> {
        let mut order = Self::catalog();
        order.shuffle(rng);
        order.push(AccessStrategy::Direct);
        order
    }

    pub fn name(&self) -> &'static str {
        match self {
            AccessStrategy::UrlRelay { name, .. } => name,
            AccessStrategy::FormRelay { name, .. } => name,
            AccessStrategy::Direct => "direct",
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, AccessStrategy::Direct)
    }

    /// The URL a `UrlRelay` navigates to for `target`
    pub fn relay_url(prefix: &str, target: &str) -> String {
        format!("{}{}", prefix, urlencoding::encode(target))
    }

    /// Move the session toward `target` via this access path
    pub async fn open<P: PageControl + ?Sized>(
        &self,
        page: &P,
        target: &str,
    ) -> Result<(), BrowserError> {
        match self {
            AccessStrategy::UrlRelay { prefix, .. } => {
                page.goto(&Self::relay_url(prefix, target)).await
            }
            AccessStrategy::FormRelay {
                entry,
                input,
                submit,
                ..
            } => {
                page.goto(entry).await?;
                page.fill(input, target).await?;
                if page.click(submit).await.is_err() {
                    page.press_enter().await?;
                }
                Ok(())
            }
            AccessStrategy::Direct => page.goto(target).await,
        }
    }
}
