//! Ledger server binary

use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;
use transactions_core::{Config, Ledger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting transactions ledger server");

    // Load configuration
    let config = match std::env::var("TXN_CONFIG") {
        Ok(path) => Config::from_file(&path)
            .with_context(|| format!("failed to load config from {}", path))?,
        Err(_) => Config::from_env().context("failed to load config from environment")?,
    };

    // Open ledger
    let ledger = Ledger::open(config).await.context("failed to open ledger")?;
    tracing::info!("Ledger opened successfully");

    // Discharge reports go to the log as JSON lines
    let mut reports = ledger.service().discharge_reports();
    let report_log = tokio::spawn(async move {
        loop {
            match reports.recv().await {
                Ok(report) => match serde_json::to_string(&report) {
                    Ok(json) => tracing::info!(target: "discharge_report", "{}", json),
                    Err(e) => tracing::warn!(error = %e, "Failed to encode discharge report"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Discharge report subscriber lagged")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down ledger server");
    ledger.shutdown().await?;
    report_log.abort();

    Ok(())
}
