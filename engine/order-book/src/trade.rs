use serde::{Deserialize, Serialize};

use crate::{AgentId, InstrumentId, OrderId, Qty, TickId};

/// Trade execution record, emitted only by matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub buy_agent: AgentId,
    pub sell_agent: AgentId,
    pub buy_order: OrderId,
    pub sell_order: OrderId,
    pub instrument: InstrumentId,
    /// Midpoint of the crossing bid and ask
    pub price: f64,
    pub volume: Qty,
    pub tick: TickId,
}

impl Trade {
    /// Traded value (price x volume)
    #[inline]
    pub fn notional(&self) -> f64 {
        self.price * self.volume as f64
    }
}
