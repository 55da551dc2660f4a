use medfi::config::AppConfig;
use medfi::db;
use medfi::jobs::run_reconciliation;
use std::env;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) so DATABASE_URL from file is visible
    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Command-line flags
    let args: Vec<String> = env::args().collect();
    let run_once = args.iter().any(|a| a == "--reconcile");

    if config.database_url.is_none() {
        info!("DATABASE_URL not set; nothing to reconcile");
        return Ok(());
    }
    let store = db::open_store(&config).await?;

    if run_once {
        let report = run_reconciliation(store.as_ref()).await?;
        info!(?report, "reconciliation complete");
        return Ok(());
    }

    info!(
        "Worker starting; reconciling every {} seconds",
        config.reconcile_interval.as_secs()
    );

    let mut ticker = interval(config.reconcile_interval.max(Duration::from_secs(1)));
    loop {
        ticker.tick().await;
        if let Err(e) = run_reconciliation(store.as_ref()).await {
            error!(error = %e, "reconciliation failed");
        }
    }
}
