//! Market simulator service library
//!
//! Configuration loading, logging setup and the replica runners behind the
//! `market-sim` binary.

pub mod cli;
pub mod config;
pub mod logging;
pub mod runner;
pub mod signals;

pub use cli::Cli;
pub use config::{load_config, MarketSimConfig};
pub use logging::initialize_logging;
pub use runner::run;
pub use signals::shutdown_signal;
