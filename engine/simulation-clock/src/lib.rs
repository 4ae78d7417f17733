//! # SimulationClock
//!
//! The heartbeat of one replica. Each tick it fans the agent pool out over a
//! dedicated thread pool, lets the exchange match what was submitted, then
//! meets the other replicas for price aggregation and the end-of-tick barrier.
//!
//! The clock is generic over [`MarketSync`], so the same loop runs alone, in an
//! in-process cluster, or across processes.

pub mod clock;
pub mod config;
pub mod error;
pub mod metrics;
pub mod report;



pub use clock::SimulationClock;
pub use config::SimulationConfig;
pub use error::ClockError;
pub use metrics::{ClockMetrics, MetricsCollector};
pub use report::SimulationReport;

/// Re-export commonly used types
pub use exchange::{Exchange, GlobalViewPolicy, TickId};
pub use market_sync::MarketSync;

/// Current version of the SimulationClock
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_NUM_INSTRUMENTS: usize = 3;

pub const DEFAULT_NUM_AGENTS: usize = 8;

pub const DEFAULT_NUM_TICKS: u64 = 1000;

/// Lead replica logs progress this often
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;

/// Tick durations kept for percentile metrics
pub const DEFAULT_METRICS_HISTORY: usize = 1000;
