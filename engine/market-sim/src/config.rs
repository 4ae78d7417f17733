//! Service configuration management
//!
//! Layers, lowest priority first: built-in defaults, the TOML file given with
//! `--config`, `MARKET_SIM__*` environment variables, command line flags.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use simulation_clock::SimulationConfig;

use crate::cli::Cli;

pub const ENV_PREFIX: &str = "MARKET_SIM";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSimConfig {
    pub simulation: SimulationConfig,
    pub cluster: ClusterConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Where this process sits in the cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub replica: u32,
    pub replicas: u32,
    /// Replica 0 binds this address; the others connect to it
    pub coordinator: String,
    /// Run all replicas in this process
    pub local: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Also write report_rank_N.json
    pub write_report: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    /// pretty, json or compact
    pub format: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self { replica: 0, replicas: 1, coordinator: "127.0.0.1:7400".to_string(), local: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from("."), write_report: false }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "compact".to_string() }
    }
}

/// Load configuration from defaults, file, process environment and CLI.
pub fn load_config(cli: &Cli) -> Result<MarketSimConfig> {
    load_config_with_env(cli, None)
}

/// Same as [`load_config`] with an explicit environment instead of the process one.
pub fn load_config_with_env(cli: &Cli, env: Option<HashMap<String, String>>) -> Result<MarketSimConfig> {
    let defaults = config::Config::try_from(&MarketSimConfig::default())
        .context("Failed to serialize default configuration")?;

    let mut builder = config::Config::builder().add_source(defaults);
    if let Some(path) = &cli.config {
        tracing::debug!("Loading configuration from file: {:?}", path);
        builder = builder.add_source(config::File::from(path.as_path()).required(true));
    }
    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true).source(env),
    );

    let mut cfg: MarketSimConfig = builder
        .build()
        .context("Failed to read configuration sources")?
        .try_deserialize()
        .context("Invalid configuration")?;

    apply_cli(&mut cfg, cli);
    validate_config(&cfg)?;
    Ok(cfg)
}

fn apply_cli(cfg: &mut MarketSimConfig, cli: &Cli) {
    if let Some(replica) = cli.replica {
        cfg.cluster.replica = replica;
    }
    if let Some(replicas) = cli.replicas {
        cfg.cluster.replicas = replicas;
    }
    if let Some(addr) = &cli.coordinator {
        cfg.cluster.coordinator = addr.clone();
    }
    if cli.local {
        cfg.cluster.local = true;
    }
    if let Some(ticks) = cli.ticks {
        cfg.simulation.num_ticks = ticks;
    }
    if let Some(agents) = cli.agents {
        cfg.simulation.num_agents = agents;
    }
    if let Some(instruments) = cli.instruments {
        cfg.simulation.num_instruments = instruments;
    }
    if let Some(dir) = &cli.output_dir {
        cfg.output.dir = dir.clone();
    }
    if let Some(format) = &cli.log_format {
        cfg.logging.format = format.clone();
    }
}

/// Validate configuration
fn validate_config(cfg: &MarketSimConfig) -> Result<()> {
    cfg.simulation.validate().context("Invalid simulation settings")?;

    if cfg.cluster.replicas == 0 {
        bail!("Cluster needs at least one replica");
    }
    if !cfg.cluster.local && cfg.cluster.replica >= cfg.cluster.replicas {
        bail!("Replica {} is outside a cluster of {}", cfg.cluster.replica, cfg.cluster.replicas);
    }

    match cfg.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        other => bail!("Invalid log level: {other}"),
    }
    match cfg.logging.format.as_str() {
        "json" | "pretty" | "compact" => {}
        other => bail!("Invalid log format: {other}"),
    }
    Ok(())
}
