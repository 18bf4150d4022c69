//! Weekly Lock-in Report
//!
//! Loads the week's tables, runs the lock-in engine and publishes the report.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use lockin_service::{initialize_logging_with_config, Cli, JsonDirectorySource, LockInService, ServiceConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Flags override file and environment settings
    let mut config =
        ServiceConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    initialize_logging_with_config(&config.logging)?;
    info!("Starting lockin-report v{}", env!("CARGO_PKG_VERSION"));

    let source = JsonDirectorySource::new(config.data.dir.clone());
    let service = LockInService::new(source, config)?;

    let as_of = cli.as_of();
    let report = service
        .run(as_of)
        .await
        .with_context(|| format!("Failed to build report as of {as_of}"))?;

    service.publish(&report).await.context("Failed to publish report")?;

    info!("Report complete");
    Ok(())
}
