use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Outcome of a finished run as seen from one replica.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub replica: u32,
    pub replicas: u32,
    pub ticks: u64,
    pub local_orders: u64,
    pub local_trades: u64,
    /// Summed over every replica
    pub global_orders: u64,
    pub global_trades: u64,
    pub dropped_orders: u64,
    pub traded_volume: u64,
    pub final_prices: Vec<f64>,
    pub elapsed: Duration,
}

impl SimulationReport {
    pub fn orders_per_second(&self) -> f64 {
        per_second(self.global_orders, self.elapsed)
    }

    pub fn trades_per_second(&self) -> f64 {
        per_second(self.global_trades, self.elapsed)
    }
}

fn per_second(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { count as f64 / secs } else { 0.0 }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Simulation Complete ===")?;
        writeln!(f, "Replicas: {}  Ticks: {}", self.replicas, self.ticks)?;
        writeln!(f, "Total Execution Time: {} ms", self.elapsed.as_millis())?;
        writeln!(f, "Global Orders Submitted: {}", self.global_orders)?;
        writeln!(f, "Global Trades Executed: {}", self.global_trades)?;
        writeln!(f, "Orders per Second: {:.2}", self.orders_per_second())?;
        write!(f, "Trades per Second: {:.2}", self.trades_per_second())
    }
}
