//! # Command Line Interface

use clap::Parser;
use std::path::PathBuf;

/// Multi-replica market simulator
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "market-sim")]
#[command(version, about = "Simulate exchange replicas trading in lockstep")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// This process's replica index
    #[arg(long)]
    pub replica: Option<u32>,

    /// Total replicas in the cluster
    #[arg(long)]
    pub replicas: Option<u32>,

    /// Coordinator address (replica 0 binds it, the others connect)
    #[arg(long)]
    pub coordinator: Option<String>,

    /// Run every replica inside this process
    #[arg(long)]
    pub local: bool,

    /// Ticks to simulate
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Agents per replica
    #[arg(long)]
    pub agents: Option<usize>,

    /// Instruments per replica
    #[arg(long)]
    pub instruments: Option<usize>,

    /// Directory for trades_rank_N.csv and prices_rank_N.csv
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Log format (pretty, json, compact)
    #[arg(long)]
    pub log_format: Option<String>,
}
