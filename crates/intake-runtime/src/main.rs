//! # Identity Intake Runtime
//!
//! Entry point for the intake gateway.
//!
//! ## Startup Sequence
//!
//! 1. Read a `.env` file from the working directory or its parents, if any
//! 2. Install logging (`RUST_LOG`, default `info`)
//! 3. Load configuration from the environment
//! 4. Build the Alloy client and the HTTP service
//! 5. Serve until Ctrl+C, then drain in-flight requests

use anyhow::{Context, Result};
use intake_gateway::{GatewayConfig, IntakeService};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Before logging, so RUST_LOG may come from the file too
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    report_dotenv(dotenv);

    let config = GatewayConfig::from_env().context("failed to load configuration")?;
    info!(
        addr = %config.http_addr(),
        per_address_per_minute = config.rate_limit.per_address_per_minute,
        global_per_hour = config.rate_limit.global_per_hour,
        "Configuration loaded"
    );

    let service = IntakeService::new(config).context("failed to build intake service")?;

    service
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl+C, running until killed");
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await
        .context("intake gateway failed")?;

    Ok(())
}

/// Log the outcome of `.env` loading. A missing file is normal.
fn report_dotenv(result: dotenvy::Result<PathBuf>) -> bool {
    match result {
        Ok(path) => {
            info!(path = %path.display(), "Loaded environment file");
            true
        }
        Err(e) if e.not_found() => {
            debug!("No .env file found, using process environment only");
            false
        }
        Err(e) => {
            warn!(error = %e, "Failed to read .env file");
            false
        }
    }
}
