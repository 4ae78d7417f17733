//! Market simulator entry point
//!
//! Runs one replica per process (or all of them with `--local`), writes each
//! replica's trade log and price table, and prints the cluster summary from
//! replica 0.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use market_sim::{initialize_logging, load_config, run, shutdown_signal, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli).context("Failed to load configuration")?;
    initialize_logging(&config.logging)?;

    info!("Starting market-sim v{}", env!("CARGO_PKG_VERSION"));
    info!(
        replica = config.cluster.replica,
        replicas = config.cluster.replicas,
        local = config.cluster.local,
        "Configuration loaded"
    );

    let reports = tokio::select! {
        reports = run(&config) => reports?,
        _ = shutdown_signal() => {
            warn!("Shutdown requested, abandoning the run");
            return Ok(());
        }
    };

    if let Some(lead) = reports.iter().find(|r| r.replica == 0) {
        println!("{lead}");
        if config.cluster.local {
            for report in &reports {
                println!(
                    "Replica {}: {} orders, {} trades, final prices {:?}",
                    report.replica, report.local_orders, report.local_trades, report.final_prices
                );
            }
        }
    }

    info!("market-sim finished");
    Ok(())
}
