//! Error types for SimulationClock

use exchange::ExchangeError;
use market_sync::SyncError;
use thiserror::Error;

/// Errors that can occur in the SimulationClock
#[derive(Error, Debug)]
pub enum ClockError {
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Agent thread pool failed to start: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Clock already ran")]
    AlreadyRan,
}
