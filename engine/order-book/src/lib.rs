// OrderBook - per-instrument price-time priority matching

mod book;
mod config;
mod order;
mod trade;
mod types;

pub use book::OrderBook;
pub use config::{BookConfig, BookError, DEFAULT_INITIAL_PRICE};
pub use order::{Order, OrderBuilder};
pub use trade::Trade;
pub use types::{AgentId, InstrumentId, OrderId, Qty, Side, TickId};
