// engine/order-book/src/book.rs

use core::cmp::Ordering;

use tracing::trace;

use crate::{BookConfig, BookError, InstrumentId, Order, Qty, Side, TickId, Trade};

/// Resting orders for one instrument plus its trade price state.
///
/// Resting collections are unordered between calls; priority is established by
/// sorting at the start of each `match_orders`. The last price and the price
/// history live for the whole life of the book.
#[derive(Debug, Clone)]
pub struct OrderBook {
    instrument: InstrumentId,
    bids: Vec<Order>,
    asks: Vec<Order>,
    last_price: f64,
    history: Vec<f64>,
}

/// Bids: price descending, then earliest timestamp, then lowest id.
fn bid_priority(a: &Order, b: &Order) -> Ordering {
    b.price()
        .total_cmp(&a.price())
        .then_with(|| a.timestamp().cmp(&b.timestamp()))
        .then_with(|| a.order_id().cmp(&b.order_id()))
}

/// Asks: price ascending, then earliest timestamp, then lowest id.
fn ask_priority(a: &Order, b: &Order) -> Ordering {
    a.price()
        .total_cmp(&b.price())
        .then_with(|| a.timestamp().cmp(&b.timestamp()))
        .then_with(|| a.order_id().cmp(&b.order_id()))
}

impl OrderBook {
    pub fn new(cfg: BookConfig) -> Result<Self, BookError> {
        cfg.validate()?;
        Ok(Self {
            instrument: cfg.instrument,
            bids: Vec::new(),
            asks: Vec::new(),
            last_price: cfg.initial_price,
            history: Vec::new(),
        })
    }

    #[inline]
    pub fn instrument(&self) -> InstrumentId {
        self.instrument
    }

    /// Place an order on its side. The caller has already checked volume and instrument.
    pub fn add_order(&mut self, order: Order) {
        debug_assert_eq!(order.instrument(), self.instrument);
        match order.side() {
            Side::Buy => self.bids.push(order),
            Side::Sell => self.asks.push(order),
        }
    }

    /// Run price-time priority matching over everything resting and return the
    /// trades in execution order.
    pub fn match_orders(&mut self, tick: TickId) -> Vec<Trade> {
        // No cross: leave resting state exactly as it was.
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) if bid >= ask => {}
            _ => return Vec::new(),
        }

        self.bids.sort_by(bid_priority);
        self.asks.sort_by(ask_priority);

        let mut trades = Vec::new();
        let (mut bi, mut ai) = (0usize, 0usize);

        while bi < self.bids.len() && ai < self.asks.len() {
            let (bid_px, ask_px) = (self.bids[bi].price(), self.asks[ai].price());
            if bid_px < ask_px {
                break;
            }

            let qty = self.bids[bi].remaining().min(self.asks[ai].remaining());
            let price = (bid_px + ask_px) / 2.0;

            let (buy, sell) = (&mut self.bids[bi], &mut self.asks[ai]);
            buy.fill(qty);
            sell.fill(qty);

            trades.push(Trade {
                buy_agent: buy.agent(),
                sell_agent: sell.agent(),
                buy_order: buy.order_id(),
                sell_order: sell.order_id(),
                instrument: self.instrument,
                price,
                volume: qty,
                tick,
            });
            self.last_price = price;
            self.history.push(price);

            if buy.is_filled() {
                bi += 1;
            }
            if sell.is_filled() {
                ai += 1;
            }
        }

        // Everything before the cursors was fully consumed.
        self.bids.drain(..bi);
        self.asks.drain(..ai);

        trace!(instrument = self.instrument, tick, trades = trades.len(), "matched");
        trades
    }

    /// Mean of every executed trade price, or the last price before the first trade.
    pub fn historical_average(&self) -> f64 {
        if self.history.is_empty() {
            return self.last_price;
        }
        self.history.iter().sum::<f64>() / self.history.len() as f64
    }

    #[inline]
    pub fn last_price(&self) -> f64 {
        self.last_price
    }

    #[inline]
    pub fn price_history(&self) -> &[f64] {
        &self.history
    }

    pub fn resting_bids(&self) -> &[Order] {
        &self.bids
    }

    pub fn resting_asks(&self) -> &[Order] {
        &self.asks
    }

    pub fn best_bid(&self) -> Option<f64> {
        self.bids.iter().map(Order::price).max_by(f64::total_cmp)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.iter().map(Order::price).min_by(f64::total_cmp)
    }

    /// Remaining resting volume per side as `(bids, asks)`.
    pub fn depth(&self) -> (Qty, Qty) {
        let sum = |v: &[Order]| v.iter().map(Order::remaining).sum();
        (sum(&self.bids), sum(&self.asks))
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}
