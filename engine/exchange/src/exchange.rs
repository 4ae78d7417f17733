use order_book::{BookConfig, InstrumentId, Order, OrderBook, OrderId, Qty, TickId, Trade};
use tracing::{debug, info};

use crate::config::{ExchangeConfig, ExchangeError, GlobalViewPolicy};
use crate::inbox::Inbox;

/// Last price of every instrument right after a tick was processed.
#[derive(Debug, Clone, PartialEq)]
pub struct TickPrices {
    pub tick: TickId,
    pub prices: Vec<f64>,
}

/// Running counters for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExchangeStats {
    pub accepted: u64,
    pub dropped: u64,
    pub trades: u64,
    pub volume: Qty,
}

pub struct Exchange {
    config: ExchangeConfig,
    books: Vec<OrderBook>,
    inbox: Inbox,
    trade_log: Vec<Trade>,
    tick_prices: Vec<TickPrices>,
    global_view: Option<Vec<f64>>,
    traded_volume: Qty,
}

impl Exchange {
    pub fn new(config: ExchangeConfig) -> Result<Self, ExchangeError> {
        config.validate()?;

        let books = (0..config.num_instruments as InstrumentId)
            .map(|instrument| OrderBook::new(BookConfig::new(instrument, config.initial_price)))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            replica = config.replica,
            instruments = config.num_instruments,
            initial_price = config.initial_price,
            "exchange created"
        );

        Ok(Self {
            config,
            books,
            inbox: Inbox::new(),
            trade_log: Vec::new(),
            tick_prices: Vec::new(),
            global_view: None,
            traded_volume: 0,
        })
    }

    /// Handle for the concurrent submission phase.
    pub fn submission(&self) -> SubmissionHandle<'_> {
        SubmissionHandle { exchange: self }
    }

    /// Drain the inbox into the books and match every book in instrument order.
    /// Returns the number of trades executed this tick.
    pub fn process_tick(&mut self, tick: TickId) -> usize {
        let pending = self.inbox.drain();
        let ingested = pending.len();
        for order in pending {
            // Instrument was range-checked at submission.
            self.books[order.instrument() as usize].add_order(order);
        }

        let before = self.trade_log.len();
        for book in &mut self.books {
            let trades = book.match_orders(tick);
            self.traded_volume += trades.iter().map(|t| t.volume).sum::<Qty>();
            self.trade_log.extend(trades);
        }
        let executed = self.trade_log.len() - before;

        self.tick_prices.push(TickPrices { tick, prices: self.price_snapshot() });

        debug!(replica = self.config.replica, tick, ingested, executed, "tick processed");
        executed
    }

    /// Current last price per instrument, indexed by instrument id.
    pub fn price_snapshot(&self) -> Vec<f64> {
        self.books.iter().map(OrderBook::last_price).collect()
    }

    /// Take in the cluster-wide price view for this round.
    pub fn apply_global_view(&mut self, prices: &[f64]) -> Result<(), ExchangeError> {
        if prices.len() != self.books.len() {
            return Err(ExchangeError::ViewLength { expected: self.books.len(), got: prices.len() });
        }
        match self.config.global_view {
            GlobalViewPolicy::Ignore => {}
            GlobalViewPolicy::Record => self.global_view = Some(prices.to_vec()),
        }
        Ok(())
    }

    /// Latest recorded aggregate, only ever set under [`GlobalViewPolicy::Record`].
    pub fn global_view(&self) -> Option<&[f64]> {
        self.global_view.as_deref()
    }

    pub fn stats(&self) -> ExchangeStats {
        ExchangeStats {
            accepted: self.inbox.accepted(),
            dropped: self.inbox.dropped(),
            trades: self.trade_log.len() as u64,
            volume: self.traded_volume,
        }
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    pub fn replica(&self) -> u32 {
        self.config.replica
    }

    pub fn num_instruments(&self) -> usize {
        self.books.len()
    }

    pub fn book(&self, instrument: InstrumentId) -> Option<&OrderBook> {
        self.books.get(instrument as usize)
    }

    pub fn books(&self) -> &[OrderBook] {
        &self.books
    }

    /// Every trade in execution order since the exchange was created.
    pub fn trade_log(&self) -> &[Trade] {
        &self.trade_log
    }

    pub fn tick_prices(&self) -> &[TickPrices] {
        &self.tick_prices
    }

    pub fn pending(&self) -> usize {
        self.inbox.len()
    }
}

/// Shared view of an exchange during the submission phase.
///
/// Holding one borrows the exchange immutably, so `process_tick` cannot run
/// until every handle is gone.
#[derive(Clone, Copy)]
pub struct SubmissionHandle<'a> {
    exchange: &'a Exchange,
}

impl<'a> SubmissionHandle<'a> {
    /// Enqueue an order for the next tick. Malformed orders and unknown
    /// instruments are dropped and `None` is returned.
    pub fn submit_order(&self, order: Order) -> Option<OrderId> {
        let exchange = self.exchange;
        if !order.is_well_formed() || order.instrument() as usize >= exchange.books.len() {
            exchange.inbox.reject();
            return None;
        }
        Some(exchange.inbox.push(order))
    }

    pub fn price(&self, instrument: InstrumentId) -> Option<f64> {
        self.exchange.book(instrument).map(OrderBook::last_price)
    }

    pub fn historical_average(&self, instrument: InstrumentId) -> Option<f64> {
        self.exchange.book(instrument).map(OrderBook::historical_average)
    }

    pub fn num_instruments(&self) -> usize {
        self.exchange.num_instruments()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use order_book::Side;

    use super::*;

    fn exchange(instruments: usize) -> Exchange {
        Exchange::new(ExchangeConfig { num_instruments: instruments, ..Default::default() }).unwrap()
    }

    #[test]
    fn invalid_initial_price_surfaces_as_book_error() {
        let cfg = ExchangeConfig { initial_price: -1.0, ..Default::default() };
        assert!(matches!(Exchange::new(cfg), Err(ExchangeError::Book(_))));
    }

    #[test]
    fn malformed_and_unknown_instrument_orders_are_dropped() {
        let ex = exchange(2);
        let handle = ex.submission();

        assert_eq!(handle.submit_order(Order::new(1, 0, Side::Buy, 100.0, 0, 0)), None);
        assert_eq!(handle.submit_order(Order::new(1, 2, Side::Buy, 100.0, 1, 0)), None);
        assert_eq!(handle.submit_order(Order::new(1, 0, Side::Buy, f64::NAN, 1, 0)), None);
        assert_eq!(handle.submit_order(Order::new(1, 1, Side::Buy, 100.0, 1, 0)), Some(1));

        let stats = ex.stats();
        assert_eq!((stats.accepted, stats.dropped), (1, 3));
        assert_eq!(ex.pending(), 1);
    }

    #[test]
    fn thousand_concurrent_submissions_land_exactly_once() {
        let mut ex = exchange(3);
        {
            let handle = ex.submission();
            std::thread::scope(|s| {
                for worker in 0..10u32 {
                    s.spawn(move || {
                        for i in 0..100u32 {
                            let instrument = (worker + i) % 3;
                            handle.submit_order(Order::new(worker, instrument, Side::Buy, 100.0, 1, 0));
                        }
                    });
                }
            });
        }

        assert_eq!(ex.process_tick(0), 0);
        assert_eq!(ex.pending(), 0);

        let resting: Vec<_> = ex.books().iter().flat_map(|b| b.resting_bids()).collect();
        assert_eq!(resting.len(), 1000);
        let ids: HashSet<_> = resting.iter().map(|o| o.order_id()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| (1..=1000).contains(id)));
    }

    #[test]
    fn process_tick_matches_every_book_and_logs_in_order() {
        let mut ex = exchange(2);
        let handle = ex.submission();
        handle.submit_order(Order::new(1, 1, Side::Buy, 101.0, 5, 0));
        handle.submit_order(Order::new(2, 1, Side::Sell, 99.0, 3, 0));
        handle.submit_order(Order::new(3, 0, Side::Buy, 110.0, 2, 0));
        handle.submit_order(Order::new(4, 0, Side::Sell, 100.0, 2, 0));

        assert_eq!(ex.process_tick(0), 2);
        let log = ex.trade_log();
        assert_eq!(log[0].instrument, 0);
        assert_eq!(log[0].price, 105.0);
        assert_eq!(log[1].instrument, 1);
        assert_eq!(log[1].price, 100.0);

        assert_eq!(ex.price_snapshot(), vec![105.0, 100.0]);
        assert_eq!(ex.tick_prices(), &[TickPrices { tick: 0, prices: vec![105.0, 100.0] }]);
        assert_eq!(ex.stats().volume, 5);

        let handle = ex.submission();
        assert_eq!(handle.price(1), Some(100.0));
        assert_eq!(handle.historical_average(0), Some(105.0));
        assert_eq!(handle.price(7), None);
    }

    #[test]
    fn snapshot_before_any_trade_is_initial_price() {
        let mut ex = exchange(3);
        assert_eq!(ex.process_tick(0), 0);
        assert_eq!(ex.price_snapshot(), vec![100.0; 3]);
    }

    #[test]
    fn global_view_policy() {
        let mut ignore = exchange(2);
        ignore.apply_global_view(&[1.0, 2.0]).unwrap();
        assert_eq!(ignore.global_view(), None);
        assert!(matches!(
            ignore.apply_global_view(&[1.0]),
            Err(ExchangeError::ViewLength { expected: 2, got: 1 })
        ));

        let mut record = Exchange::new(ExchangeConfig {
            num_instruments: 2,
            global_view: GlobalViewPolicy::Record,
            ..Default::default()
        })
        .unwrap();
        record.apply_global_view(&[1.0, 2.0]).unwrap();
        assert_eq!(record.global_view(), Some(&[1.0, 2.0][..]));
        assert_eq!(record.price_snapshot(), vec![100.0, 100.0]);
    }
}
