use std::process::ExitCode;

use tracing::{error, info};

use panel_keeper::config::{load_accounts, Settings};
use panel_keeper::notify::{Notify, Telegram};
use panel_keeper::{init_logging, orchestrator};

#[tokio::main]
async fn main() -> ExitCode {
    let _guard = init_logging();

    info!("{}", "=".repeat(50));
    info!("🚀 panel-keeper: automated console sign-in");
    info!("{}", "=".repeat(50));

    let settings = Settings::from_env();
    let accounts = load_accounts();
    if accounts.is_empty() {
        error!("❌ No valid account configuration found");
        error!("Set ACCOUNTS_JSON (JSON array) or PANEL_USERNAME / PANEL_PASSWORD");
        return ExitCode::FAILURE;
    }
    info!("📋 Found {} account(s)", accounts.len());

    let notifier = Telegram::from_env();
    if !notifier.is_configured() {
        info!("Telegram not configured, reports stay local");
    }

    let totals = orchestrator::run(&settings, &notifier, &accounts).await;

    info!(
        "🏁 Done: {} succeeded, {} failed",
        totals.succeeded, totals.failed
    );

    if totals.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
