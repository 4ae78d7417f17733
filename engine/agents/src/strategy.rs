use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Coin flip, quotes 1% away from the last price
    RandomWalk,
    /// Buys when price runs above its average, sells otherwise
    Momentum,
    /// Buys when price dips below its average, sells otherwise
    MeanReversion,
    /// Quotes both sides around the last price
    MarketMaker,
}

impl Strategy {
    pub const ALL: [Strategy; 4] =
        [Strategy::RandomWalk, Strategy::Momentum, Strategy::MeanReversion, Strategy::MarketMaker];

    /// Round-robin assignment by agent slot.
    pub fn for_slot(slot: usize) -> Self {
        Self::ALL[slot % Self::ALL.len()]
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::RandomWalk => "random_walk",
            Strategy::Momentum => "momentum",
            Strategy::MeanReversion => "mean_reversion",
            Strategy::MarketMaker => "market_maker",
        };
        f.write_str(name)
    }
}
