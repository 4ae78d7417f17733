//! Configuration for SimulationClock

use std::path::Path;

use exchange::{ExchangeConfig, GlobalViewPolicy};
use order_book::DEFAULT_INITIAL_PRICE;
use serde::{Deserialize, Serialize};

use crate::error::ClockError;
use crate::{
    DEFAULT_METRICS_HISTORY, DEFAULT_NUM_AGENTS, DEFAULT_NUM_INSTRUMENTS, DEFAULT_NUM_TICKS,
    DEFAULT_PROGRESS_INTERVAL,
};

/// Configuration for one replica's simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Instruments listed on every replica
    pub num_instruments: usize,

    /// Agents per replica (one worker slot each)
    pub num_agents: usize,

    /// Ticks to simulate
    pub num_ticks: u64,

    /// Last price of every instrument before its first trade
    pub initial_price: f64,

    /// Progress log cadence in ticks on the lead replica (0 disables)
    pub progress_interval: u64,

    /// What the exchange does with the aggregated cluster prices
    pub global_view: GlobalViewPolicy,

    /// Agent pool size; defaults to one thread per agent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_threads: Option<usize>,

    pub momentum_threshold: f64,

    pub reversion_threshold: f64,

    /// Tick durations kept for percentiles
    pub metrics_history: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_instruments: DEFAULT_NUM_INSTRUMENTS,
            num_agents: DEFAULT_NUM_AGENTS,
            num_ticks: DEFAULT_NUM_TICKS,
            initial_price: DEFAULT_INITIAL_PRICE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            global_view: GlobalViewPolicy::Ignore,
            worker_threads: None,
            momentum_threshold: 0.5,
            reversion_threshold: 0.5,
            metrics_history: DEFAULT_METRICS_HISTORY,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ClockError> {
        if self.num_instruments == 0 {
            return Err(ClockError::Config("num_instruments must be at least 1".into()));
        }
        if self.num_agents == 0 {
            return Err(ClockError::Config("num_agents must be at least 1".into()));
        }
        if !self.initial_price.is_finite() || self.initial_price <= 0.0 {
            return Err(ClockError::Config(format!(
                "initial_price must be finite and positive, got {}",
                self.initial_price
            )));
        }
        if self.worker_threads == Some(0) {
            return Err(ClockError::Config("worker_threads must be at least 1".into()));
        }
        if self.metrics_history == 0 {
            return Err(ClockError::Config("metrics_history must be at least 1".into()));
        }
        Ok(())
    }

    /// Threads in the agent pool
    pub fn pool_size(&self) -> usize {
        self.worker_threads.unwrap_or(self.num_agents)
    }

    /// Exchange settings for `replica`
    pub fn exchange_config(&self, replica: u32) -> ExchangeConfig {
        ExchangeConfig {
            replica,
            num_instruments: self.num_instruments,
            initial_price: self.initial_price,
            global_view: self.global_view,
        }
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClockError> {
        let content = std::fs::read_to_string(path)?;
        let config: SimulationConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ClockError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
