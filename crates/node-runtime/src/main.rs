//! # Permissioned Ledger Node
//!
//! Brings the channel up, deploys every configured contract, starts the
//! event listeners and keeps the ledger gateway available until Ctrl+C.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file named by `PC_NETWORK_CONFIG`, `PC_*` overrides)
//! 2. Ensure the channel and its membership
//! 3. Deploy and initialize each contract
//! 4. Start block and contract-event listeners
//! 5. Serve until shutdown
//!
//! Any startup failure releases what was acquired and exits non-zero.

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use node_runtime::{load_config, NodeRuntime};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config().context("Failed to load node configuration")?;
    let runtime = NodeRuntime::new(config).context("Failed to assemble node")?;

    let report = match runtime.start().await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Startup failed");
            runtime.shutdown().await;
            return Err(e).context("Node startup failed");
        }
    };
    for deployment in &report.deployments {
        info!(
            contract = %deployment.name,
            sequence = deployment.sequence,
            package_id = %deployment.package_id,
            "Contract deployed"
        );
    }
    info!(channel = %report.channel.channel_id, "Node running. Press Ctrl+C to stop.");

    // Graceful shutdown on Ctrl+C, or if the signal handler cannot be installed
    runtime
        .serve_until(tokio::signal::ctrl_c())
        .await
        .context("Node stopped without a shutdown signal")?;

    Ok(())
}
