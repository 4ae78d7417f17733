//! Metrics collection for SimulationClock

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Metrics snapshot for one replica
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockMetrics {
    /// Last tick recorded
    pub current_tick: u64,

    /// Duration of the last tick in nanoseconds
    pub tick_duration_ns: u64,

    /// Ticks per second since the collector started
    pub tick_rate_hz: f64,

    /// Orders submitted in the last tick
    pub orders_last_tick: u64,

    /// Trades executed in the last tick
    pub trades_last_tick: u64,

    /// Average tick duration in nanoseconds
    pub avg_tick_duration_ns: u64,

    /// Maximum tick duration in nanoseconds
    pub max_tick_duration_ns: u64,

    /// 95th percentile tick duration in nanoseconds
    pub p95_tick_duration_ns: u64,

    /// 99th percentile tick duration in nanoseconds
    pub p99_tick_duration_ns: u64,

    pub total_ticks_processed: u64,

    pub total_orders: u64,

    pub total_trades: u64,
}

/// Lock-free metrics collector
pub struct MetricsCollector {
    // Tick metrics
    current_tick: AtomicU64,
    tick_durations: Vec<AtomicU64>,
    max_tick_duration: AtomicU64,
    total_ticks: AtomicU64,

    // Flow metrics
    orders_last_tick: AtomicU64,
    trades_last_tick: AtomicU64,
    total_orders: AtomicU64,
    total_trades: AtomicU64,

    start_time: Instant,
    history_size: usize,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new(history_size: usize) -> Self {
        let history_size = history_size.max(1);
        Self {
            current_tick: AtomicU64::new(0),
            tick_durations: (0..history_size).map(|_| AtomicU64::new(0)).collect(),
            max_tick_duration: AtomicU64::new(0),
            total_ticks: AtomicU64::new(0),
            orders_last_tick: AtomicU64::new(0),
            trades_last_tick: AtomicU64::new(0),
            total_orders: AtomicU64::new(0),
            total_trades: AtomicU64::new(0),
            start_time: Instant::now(),
            history_size,
        }
    }

    /// Record a completed tick
    pub fn record_tick(&self, tick: u64, duration: Duration, orders: u64, trades: u64) {
        let duration_ns = duration.as_nanos() as u64;
        let index = (tick as usize) % self.history_size;

        self.current_tick.store(tick, Ordering::Relaxed);
        self.tick_durations[index].store(duration_ns, Ordering::Relaxed);
        self.total_ticks.fetch_add(1, Ordering::Relaxed);
        self.orders_last_tick.store(orders, Ordering::Relaxed);
        self.trades_last_tick.store(trades, Ordering::Relaxed);
        self.total_orders.fetch_add(orders, Ordering::Relaxed);
        self.total_trades.fetch_add(trades, Ordering::Relaxed);

        self.max_tick_duration.fetch_max(duration_ns, Ordering::Relaxed);
    }

    pub fn total_orders(&self) -> u64 {
        self.total_orders.load(Ordering::Relaxed)
    }

    pub fn total_trades(&self) -> u64 {
        self.total_trades.load(Ordering::Relaxed)
    }

    /// Get current metrics
    pub fn get_metrics(&self) -> ClockMetrics {
        let current_tick = self.current_tick.load(Ordering::Relaxed);
        let total_ticks = self.total_ticks.load(Ordering::Relaxed);
        let elapsed = self.start_time.elapsed().as_secs_f64();

        let tick_rate_hz = if elapsed > 0.0 { total_ticks as f64 / elapsed } else { 0.0 };

        let last_index = (current_tick as usize) % self.history_size;
        let tick_duration_ns = self.tick_durations[last_index].load(Ordering::Relaxed);

        let mut durations: Vec<u64> = self
            .tick_durations
            .iter()
            .map(|d| d.load(Ordering::Relaxed))
            .filter(|&d| d > 0)
            .collect();
        durations.sort_unstable();

        let avg_tick_duration_ns = if durations.is_empty() {
            0
        } else {
            durations.iter().sum::<u64>() / durations.len() as u64
        };

        ClockMetrics {
            current_tick,
            tick_duration_ns,
            tick_rate_hz,
            orders_last_tick: self.orders_last_tick.load(Ordering::Relaxed),
            trades_last_tick: self.trades_last_tick.load(Ordering::Relaxed),
            avg_tick_duration_ns,
            max_tick_duration_ns: self.max_tick_duration.load(Ordering::Relaxed),
            p95_tick_duration_ns: percentile(&durations, 0.95),
            p99_tick_duration_ns: percentile(&durations, 0.99),
            total_ticks_processed: total_ticks,
            total_orders: self.total_orders(),
            total_trades: self.total_trades(),
        }
    }

    /// Reset all metrics
    pub fn reset(&self) {
        for counter in [
            &self.current_tick,
            &self.max_tick_duration,
            &self.total_ticks,
            &self.orders_last_tick,
            &self.trades_last_tick,
            &self.total_orders,
            &self.total_trades,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        for duration in &self.tick_durations {
            duration.store(0, Ordering::Relaxed);
        }
    }
}

/// Sorted input
fn percentile(sorted: &[u64], q: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let index = (sorted.len() as f64 * q) as usize;
    sorted[index.min(sorted.len() - 1)]
}
