//! # Exchange
//!
//! One replica's market: a book per instrument, a minimally locked inbox that
//! many agent threads submit into, and the single-threaded tick that drains the
//! inbox and runs matching.
//!
//! The two phases are split at the type level. [`Exchange::submission`] hands
//! out a shared [`SubmissionHandle`] for the concurrent phase, and
//! [`Exchange::process_tick`] needs `&mut Exchange`, so processing cannot start
//! while a handle is still borrowed.

mod config;
mod exchange;
pub mod export;
mod inbox;

pub use config::{ExchangeConfig, ExchangeError, GlobalViewPolicy};
pub use exchange::{Exchange, ExchangeStats, SubmissionHandle, TickPrices};

pub use order_book::{
    AgentId, InstrumentId, Order, OrderBook, OrderId, Qty, Side, TickId, Trade,
};
