//! # ledger-sync
//!
//! Runs the sync client against the in-process simulated ledger until
//! Ctrl+C, then persists the reconciled store.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Initialize telemetry
//! 3. Seed the simulated ledger
//! 4. Build the sync context and start the runtime
//! 5. Confirm the configured top-up, if any
//! 6. Wait for Ctrl+C, then shut down

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use sync_runtime::{SimulatedLedger, SyncConfig, SyncContext, SyncRuntime};
use sync_telemetry::init_telemetry;

/// Period of simulated ledger activity.
const LEDGER_ACTIVITY: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> Result<()> {
    let config = SyncConfig::from_env().context("Failed to load configuration")?;
    init_telemetry(&config.telemetry).context("Failed to initialize telemetry")?;

    info!("===========================================");
    info!("  ledger-sync v{}", sync_runtime::VERSION);
    info!("===========================================");

    let ledger = Arc::new(SimulatedLedger::seeded(&config));
    let top_up = config.top_up_block.zip(config.top_up_target());

    let context = SyncContext::build(config, ledger.clone(), ledger.clone())
        .context("Failed to build sync context")?;
    let runtime = Arc::new(SyncRuntime::new(context));
    runtime.start().await.context("Failed to start sync runtime")?;

    let activity = {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(LEDGER_ACTIVITY);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                ledger.advance();
            }
        })
    };

    let confirmation = top_up.map(|(block, canister)| {
        let runtime = Arc::clone(&runtime);
        tokio::spawn(async move {
            match runtime.confirm_top_up(&canister, block).await {
                Ok(balance) => info!(canister = %canister, cycles = balance.cycles, "Top-up confirmed"),
                Err(err) => warn!(canister = %canister, block, error = %err, "Top-up not confirmed"),
            }
        })
    });

    info!("Sync client running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    activity.abort();
    if let Some(confirmation) = confirmation {
        confirmation.abort();
    }
    let persisted = runtime.shutdown().await.context("Shutdown failed")?;
    info!(persisted, "Snapshots persisted");
    Ok(())
}
