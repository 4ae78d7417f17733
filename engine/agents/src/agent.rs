use order_book::{AgentId, InstrumentId, Order, Qty, Side, TickId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::Strategy;

const DEFAULT_THRESHOLD: f64 = 0.5;

/// One trading agent with its own deterministic random stream.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    strategy: Strategy,
    instrument: InstrumentId,
    momentum_threshold: f64,
    reversion_threshold: f64,
    rng: ChaCha8Rng,
}

impl Agent {
    /// Seeded from the global agent id, so a rerun replays the same orders.
    pub fn new(id: AgentId, strategy: Strategy, instrument: InstrumentId) -> Self {
        Self {
            id,
            strategy,
            instrument,
            momentum_threshold: DEFAULT_THRESHOLD,
            reversion_threshold: DEFAULT_THRESHOLD,
            rng: ChaCha8Rng::seed_from_u64(u64::from(id)),
        }
    }

    pub fn with_thresholds(mut self, momentum: f64, reversion: f64) -> Self {
        self.momentum_threshold = momentum;
        self.reversion_threshold = reversion;
        self
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn instrument(&self) -> InstrumentId {
        self.instrument
    }

    /// Candidate orders for this tick given the instrument's last price and
    /// its historical average.
    pub fn generate(&mut self, instrument: InstrumentId, price: f64, average: f64, tick: TickId) -> Vec<Order> {
        match self.strategy {
            Strategy::RandomWalk => {
                let side = if self.rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
                let px = match side {
                    Side::Buy => price * 0.99,
                    Side::Sell => price * 1.01,
                };
                vec![self.order(instrument, side, px, 10, tick)]
            }
            Strategy::Momentum => {
                let buy = price > average * (1.0 + 0.001 * self.momentum_threshold);
                let (side, px) = if buy { (Side::Buy, price * 1.005) } else { (Side::Sell, price * 0.995) };
                vec![self.order(instrument, side, px, 10, tick)]
            }
            Strategy::MeanReversion => {
                let buy = price < average * (1.0 - 0.001 * self.reversion_threshold);
                let (side, px) = if buy { (Side::Buy, price * 1.002) } else { (Side::Sell, price * 0.998) };
                vec![self.order(instrument, side, px, 10, tick)]
            }
            Strategy::MarketMaker => {
                let bid = self.order(instrument, Side::Buy, price * 0.999, 5, tick);
                let ask = self.order(instrument, Side::Sell, price * 1.001, 5, tick);
                vec![bid, ask]
            }
        }
    }

    fn order(&mut self, instrument: InstrumentId, side: Side, price: f64, max_volume: Qty, tick: TickId) -> Order {
        let volume = self.rng.gen_range(1..=max_volume);
        Order::new(self.id, instrument, side, price, volume, tick)
    }
}

/// The agents one replica runs, one per worker slot.
#[derive(Debug, Clone)]
pub struct AgentPool {
    agents: Vec<Agent>,
}

impl AgentPool {
    /// Slot `s` trades instrument `s % instruments` with the strategy
    /// round-robin picks for it; global ids are `replica * agents + s`.
    pub fn new(replica: u32, count: usize, instruments: usize) -> Self {
        let instruments = instruments.max(1);
        let agents = (0..count)
            .map(|slot| {
                let id = replica * count as u32 + slot as u32;
                Agent::new(id, Strategy::for_slot(slot), (slot % instruments) as InstrumentId)
            })
            .collect();
        Self { agents }
    }

    pub fn with_thresholds(self, momentum: f64, reversion: f64) -> Self {
        let agents = self.agents.into_iter().map(|a| a.with_thresholds(momentum, reversion)).collect();
        Self { agents }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_id_replays_same_orders() {
        let mut a = Agent::new(7, Strategy::RandomWalk, 0);
        let mut b = Agent::new(7, Strategy::RandomWalk, 0);
        for tick in 0..20 {
            assert_eq!(a.generate(0, 100.0, 100.0, tick), b.generate(0, 100.0, 100.0, tick));
        }
    }

    #[test]
    fn random_walk_quotes_one_percent_away() {
        let mut agent = Agent::new(3, Strategy::RandomWalk, 1);
        for tick in 0..50 {
            let orders = agent.generate(1, 200.0, 200.0, tick);
            assert_eq!(orders.len(), 1);
            let o = &orders[0];
            match o.side() {
                Side::Buy => assert!((o.price() - 198.0).abs() < 1e-9),
                Side::Sell => assert!((o.price() - 202.0).abs() < 1e-9),
            }
            assert!((1..=10).contains(&o.volume()));
            assert_eq!(o.timestamp(), tick);
            assert_eq!(o.agent(), 3);
        }
    }

    #[test]
    fn momentum_follows_the_trend() {
        let mut agent = Agent::new(1, Strategy::Momentum, 0);
        let up = agent.generate(0, 101.0, 100.0, 0);
        assert_eq!(up[0].side(), Side::Buy);
        assert!((up[0].price() - 101.0 * 1.005).abs() < 1e-9);

        // Within the threshold band counts as no trend.
        let flat = agent.generate(0, 100.04, 100.0, 1);
        assert_eq!(flat[0].side(), Side::Sell);
        assert!((flat[0].price() - 100.04 * 0.995).abs() < 1e-9);
    }

    #[test]
    fn mean_reversion_buys_the_dip() {
        let mut agent = Agent::new(2, Strategy::MeanReversion, 0);
        let dip = agent.generate(0, 99.0, 100.0, 0);
        assert_eq!(dip[0].side(), Side::Buy);
        assert!((dip[0].price() - 99.0 * 1.002).abs() < 1e-9);

        let rich = agent.generate(0, 100.0, 100.0, 1);
        assert_eq!(rich[0].side(), Side::Sell);
        assert!((rich[0].price() - 99.8).abs() < 1e-9);
    }

    #[test]
    fn market_maker_quotes_both_sides() {
        let mut agent = Agent::new(4, Strategy::MarketMaker, 2);
        let orders = agent.generate(2, 100.0, 100.0, 5);
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].side(), Side::Buy);
        assert!((orders[0].price() - 99.9).abs() < 1e-9);
        assert_eq!(orders[1].side(), Side::Sell);
        assert!((orders[1].price() - 100.1).abs() < 1e-9);
        assert!(orders.iter().all(|o| (1..=5).contains(&o.volume()) && o.instrument() == 2));
    }

    #[test]
    fn pool_assigns_ids_instruments_and_strategies() {
        let pool = AgentPool::new(2, 8, 3);
        assert_eq!(pool.len(), 8);
        let a = &pool.agents()[5];
        assert_eq!(a.id(), 2 * 8 + 5);
        assert_eq!(a.instrument(), 2);
        assert_eq!(a.strategy(), Strategy::Momentum);
        assert_eq!(pool.agents()[3].strategy(), Strategy::MarketMaker);
        assert_eq!(pool.agents()[3].instrument(), 0);
    }
}
