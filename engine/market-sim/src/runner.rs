//! Replica runners
//!
//! Picks the sync transport for the configured cluster shape, drives each
//! replica's clock to completion and writes its output files.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use exchange::Exchange;
use market_sync::{LocalCluster, MarketSync, SoloSync, TcpSync};
use simulation_clock::{SimulationClock, SimulationConfig, SimulationReport};
use tracing::{info, warn};

use crate::config::{MarketSimConfig, OutputConfig};

/// Run the configured cluster and return one report per replica hosted by
/// this process, ordered by replica index.
pub async fn run(config: &MarketSimConfig) -> Result<Vec<SimulationReport>> {
    let cluster = &config.cluster;
    std::fs::create_dir_all(&config.output.dir)
        .with_context(|| format!("Failed to create output directory {:?}", config.output.dir))?;

    if cluster.local {
        return run_local(config).await;
    }

    let report = if cluster.replicas == 1 {
        run_replica(config.simulation.clone(), SoloSync, config.output.clone()).await?
    } else if cluster.replica == 0 {
        let sync = TcpSync::coordinator(cluster.coordinator.as_str(), cluster.replicas)
            .await
            .with_context(|| format!("Failed to bind coordinator on {}", cluster.coordinator))?;
        run_replica(config.simulation.clone(), sync, config.output.clone()).await?
    } else {
        let sync = TcpSync::connect(cluster.coordinator.as_str(), cluster.replica, cluster.replicas)
            .await
            .with_context(|| format!("Failed to join coordinator at {}", cluster.coordinator))?;
        run_replica(config.simulation.clone(), sync, config.output.clone()).await?
    };
    Ok(vec![report])
}

async fn run_local(config: &MarketSimConfig) -> Result<Vec<SimulationReport>> {
    let replicas = config.cluster.replicas;
    let threads = config.simulation.pool_size() * replicas as usize;
    let cpus = num_cpus::get();
    if threads > cpus {
        warn!(threads, cpus, "Agent threads across local replicas exceed available CPUs");
    }
    info!(replicas, "Starting in-process cluster");

    let handles: Vec<_> = LocalCluster::new(replicas)
        .into_iter()
        .map(|sync| {
            let simulation = config.simulation.clone();
            let output = config.output.clone();
            tokio::spawn(run_replica(simulation, sync, output))
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for joined in futures::future::join_all(handles).await {
        reports.push(joined.context("Replica task panicked")??);
    }
    Ok(reports)
}

/// Drive one replica to completion and write its outputs.
pub async fn run_replica<S: MarketSync>(
    simulation: SimulationConfig,
    sync: S,
    output: OutputConfig,
) -> Result<SimulationReport> {
    let replica = sync.replica();
    let mut clock = SimulationClock::new(simulation, sync)
        .with_context(|| format!("Failed to create clock for replica {replica}"))?;
    let report = clock.run().await.with_context(|| format!("Replica {replica} failed"))?;

    write_outputs(clock.exchange(), &report, &output)?;
    Ok(report)
}

/// Write `trades_rank_N.csv`, `prices_rank_N.csv` and optionally
/// `report_rank_N.json` for the replica that owns `exchange`.
pub fn write_outputs(exchange: &Exchange, report: &SimulationReport, output: &OutputConfig) -> Result<()> {
    let replica = exchange.replica();

    let trades = output_path(&output.dir, "trades", replica, "csv");
    exchange
        .write_trade_log(&trades)
        .with_context(|| format!("Failed to write {}", trades.display()))?;

    let prices = output_path(&output.dir, "prices", replica, "csv");
    exchange
        .write_price_table(&prices)
        .with_context(|| format!("Failed to write {}", prices.display()))?;

    if output.write_report {
        let path = output_path(&output.dir, "report", replica, "json");
        let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), report)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    info!(replica, dir = %output.dir.display(), "Wrote replica output");
    Ok(())
}

pub fn output_path(dir: &Path, kind: &str, replica: u32, ext: &str) -> PathBuf {
    dir.join(format!("{kind}_rank_{replica}.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClusterConfig;

    fn small_config(dir: &Path) -> MarketSimConfig {
        let mut config = MarketSimConfig::default();
        config.simulation.num_ticks = 20;
        config.simulation.num_agents = 4;
        config.simulation.num_instruments = 2;
        config.simulation.progress_interval = 0;
        config.output = OutputConfig { dir: dir.to_path_buf(), write_report: true };
        config
    }

    #[test]
    fn output_names_carry_the_replica() {
        let path = output_path(Path::new("out"), "trades", 3, "csv");
        assert_eq!(path, Path::new("out").join("trades_rank_3.csv"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn solo_run_writes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path());

        let reports = run(&config).await.unwrap();
        assert_eq!(reports.len(), 1);
        // Slot 3 is a market maker quoting both sides.
        assert_eq!(reports[0].global_orders, 20 * (3 + 2));

        for name in ["trades_rank_0.csv", "prices_rank_0.csv", "report_rank_0.json"] {
            assert!(dir.path().join(name).exists(), "missing {name}");
        }

        let prices = std::fs::read_to_string(dir.path().join("prices_rank_0.csv")).unwrap();
        assert_eq!(prices.lines().count(), 21);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("report_rank_0.json")).unwrap())
                .unwrap();
        assert_eq!(json["global_orders"], 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn local_cluster_agrees_on_totals() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config(dir.path());
        config.cluster = ClusterConfig { replicas: 3, local: true, ..Default::default() };

        let reports = run(&config).await.unwrap();
        assert_eq!(reports.len(), 3);
        for (i, report) in reports.iter().enumerate() {
            assert_eq!(report.replica, i as u32);
            assert_eq!(report.global_orders, 3 * 100);
            assert_eq!(report.global_trades, reports[0].global_trades);
            assert!(dir.path().join(format!("trades_rank_{i}.csv")).exists());
        }

        let local_sum: u64 = reports.iter().map(|r| r.local_trades).sum();
        assert_eq!(reports[0].global_trades, local_sum);
    }
}
