use serde::{Deserialize, Serialize};

use crate::{AgentId, InstrumentId, OrderId, Qty, Side, TickId};

/// A limit order as submitted by an agent.
///
/// Price, side and timestamp are fixed at creation. Only the remaining volume
/// moves, and only while the owning book is matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    agent: AgentId,
    instrument: InstrumentId,
    side: Side,
    price: f64,
    volume: Qty,
    remaining: Qty,
    timestamp: TickId,
    order_id: OrderId,
}

impl Order {
    /// Create an unstamped order (`order_id == 0` until the exchange accepts it).
    pub fn new(
        agent: AgentId,
        instrument: InstrumentId,
        side: Side,
        price: f64,
        volume: Qty,
        timestamp: TickId,
    ) -> Self {
        Self { agent, instrument, side, price, volume, remaining: volume, timestamp, order_id: 0 }
    }

    pub fn builder() -> OrderBuilder {
        OrderBuilder::default()
    }

    /// Stamp the exchange-assigned identifier.
    pub fn with_id(mut self, order_id: OrderId) -> Self {
        self.order_id = order_id;
        self
    }

    #[inline]
    pub fn agent(&self) -> AgentId {
        self.agent
    }
    #[inline]
    pub fn instrument(&self) -> InstrumentId {
        self.instrument
    }
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }
    #[inline]
    pub fn price(&self) -> f64 {
        self.price
    }
    #[inline]
    pub fn volume(&self) -> Qty {
        self.volume
    }
    #[inline]
    pub fn remaining(&self) -> Qty {
        self.remaining
    }
    #[inline]
    pub fn timestamp(&self) -> TickId {
        self.timestamp
    }
    #[inline]
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.remaining == 0
    }

    /// True when the order can be accepted into a book at all.
    pub fn is_well_formed(&self) -> bool {
        self.volume > 0 && self.price.is_finite() && self.price > 0.0
    }

    /// Reduce the remaining volume after a fill. Caller guarantees `qty <= remaining`.
    #[inline]
    pub(crate) fn fill(&mut self, qty: Qty) {
        debug_assert!(qty <= self.remaining);
        self.remaining -= qty;
    }
}

/// Builder for orders assembled field by field
#[derive(Debug, Default)]
pub struct OrderBuilder {
    agent: Option<AgentId>,
    instrument: Option<InstrumentId>,
    side: Option<Side>,
    price: Option<f64>,
    volume: Option<Qty>,
    timestamp: Option<TickId>,
}

impl OrderBuilder {
    pub fn agent(mut self, agent: AgentId) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn instrument(mut self, instrument: InstrumentId) -> Self {
        self.instrument = Some(instrument);
        self
    }

    pub fn side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn volume(mut self, volume: Qty) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn timestamp(mut self, timestamp: TickId) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn build(self) -> Result<Order, &'static str> {
        let agent = self.agent.ok_or("agent is required")?;
        let instrument = self.instrument.ok_or("instrument is required")?;
        let side = self.side.ok_or("side is required")?;
        let price = self.price.ok_or("price is required")?;
        let volume = self.volume.ok_or("volume is required")?;
        let timestamp = self.timestamp.ok_or("timestamp is required")?;

        Ok(Order::new(agent, instrument, side, price, volume, timestamp))
    }
}
