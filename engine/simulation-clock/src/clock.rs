//! Core SimulationClock implementation

use std::time::Instant;

use agents::AgentPool;
use exchange::{Exchange, TickId};
use market_sync::{MarketSync, Round};
use rayon::prelude::*;

use crate::config::SimulationConfig;
use crate::error::ClockError;
use crate::metrics::{ClockMetrics, MetricsCollector};
use crate::report::SimulationReport;

/// Drives one replica through the tick loop.
pub struct SimulationClock<S> {
    config: SimulationConfig,
    exchange: Exchange,
    agents: AgentPool,
    pool: rayon::ThreadPool,
    sync: S,
    metrics_collector: MetricsCollector,
    finished: bool,
}

impl<S: MarketSync> SimulationClock<S> {
    /// Build the exchange, the agent pool and the worker threads for the
    /// replica that `sync` speaks for.
    pub fn new(config: SimulationConfig, sync: S) -> Result<Self, ClockError> {
        config.validate()?;
        let replica = sync.replica();

        let exchange = Exchange::new(config.exchange_config(replica))?;
        let agents = AgentPool::new(replica, config.num_agents, config.num_instruments)
            .with_thresholds(config.momentum_threshold, config.reversion_threshold);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.pool_size())
            .thread_name(move |i| format!("replica-{replica}-agent-{i}"))
            .build()?;

        tracing::info!(
            replica,
            replicas = sync.replicas(),
            agents = config.num_agents,
            instruments = config.num_instruments,
            ticks = config.num_ticks,
            "Creating SimulationClock"
        );

        Ok(Self {
            metrics_collector: MetricsCollector::new(config.metrics_history),
            config,
            exchange,
            agents,
            pool,
            sync,
            finished: false,
        })
    }

    /// Run every configured tick, then combine totals across the cluster.
    pub async fn run(&mut self) -> Result<SimulationReport, ClockError> {
        if self.finished {
            return Err(ClockError::AlreadyRan);
        }
        self.finished = true;

        let replica = self.sync.replica();
        let lead = replica == 0;
        let start = Instant::now();

        tracing::info!(replica, "Starting simulation loop");

        for tick in 0..self.config.num_ticks {
            let tick_start = Instant::now();

            // Phase 1: agents generate and submit concurrently
            let orders = self.fan_out(tick);

            // Phase 2: single-threaded ingestion and matching
            let trades = self.exchange.process_tick(tick) as u64;

            // Phase 3: cluster-wide price view
            let local = self.exchange.price_snapshot();
            let global = self.sync.aggregate(Round::aggregate(tick), &local).await.inspect_err(|e| {
                tracing::error!(replica, tick, %e, "price aggregation failed");
            })?;
            self.exchange.apply_global_view(&global)?;

            // Phase 4: nobody starts the next tick early
            self.sync.synchronize(Round::barrier(tick)).await.inspect_err(|e| {
                tracing::error!(replica, tick, %e, "tick barrier failed");
            })?;

            self.metrics_collector.record_tick(tick, tick_start.elapsed(), orders, trades);

            let done = tick + 1;
            if lead && self.config.progress_interval > 0 && done % self.config.progress_interval == 0 {
                tracing::info!(
                    tick = done,
                    orders = self.metrics_collector.total_orders(),
                    trades = self.metrics_collector.total_trades(),
                    "progress"
                );
            }
        }

        let local_orders = self.metrics_collector.total_orders();
        let local_trades = self.metrics_collector.total_trades();
        let totals = self
            .sync
            .sum(Round::totals(self.config.num_ticks), &[local_orders as f64, local_trades as f64])
            .await?;
        let elapsed = start.elapsed();
        self.sync.close().await?;

        let stats = self.exchange.stats();
        if stats.dropped > 0 {
            tracing::warn!(replica, dropped = stats.dropped, "orders dropped at submission");
        }
        tracing::info!(replica, ?elapsed, local_orders, local_trades, "Simulation loop finished");

        Ok(SimulationReport {
            replica,
            replicas: self.sync.replicas(),
            ticks: self.config.num_ticks,
            local_orders,
            local_trades,
            global_orders: totals[0].round() as u64,
            global_trades: totals[1].round() as u64,
            dropped_orders: stats.dropped,
            traded_volume: stats.volume,
            final_prices: self.exchange.price_snapshot(),
            elapsed,
        })
    }

    /// Every agent reads its instrument's price and average through the
    /// submission handle and submits what it generates. Returns the number of
    /// orders generated.
    fn fan_out(&mut self, tick: TickId) -> u64 {
        let handle = self.exchange.submission();
        let agents = self.agents.agents_mut();
        let fallback = self.config.initial_price;

        self.pool.install(|| {
            agents
                .par_iter_mut()
                .map(|agent| {
                    let instrument = agent.instrument();
                    let price = handle.price(instrument).unwrap_or(fallback);
                    let average = handle.historical_average(instrument).unwrap_or(price);

                    let orders = agent.generate(instrument, price, average, tick);
                    let generated = orders.len() as u64;
                    for order in orders {
                        handle.submit_order(order);
                    }
                    generated
                })
                .sum()
        })
    }

    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn metrics(&self) -> ClockMetrics {
        self.metrics_collector.get_metrics()
    }

    pub fn replica(&self) -> u32 {
        self.sync.replica()
    }

    /// Hand the exchange back once the run is over.
    pub fn into_exchange(self) -> Exchange {
        self.exchange
    }
}
