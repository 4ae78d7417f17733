//! CSV artifacts written once a run is over: the trade log and the per-tick
//! price table.

use std::io;
use std::path::Path;

use order_book::{AgentId, InstrumentId, Qty, TickId};
use serde::Serialize;

use crate::{Exchange, ExchangeError};

#[derive(Serialize)]
struct TradeRow {
    timestamp: TickId,
    instrument: InstrumentId,
    buy_agent: AgentId,
    sell_agent: AgentId,
    price: f64,
    volume: Qty,
}

impl Exchange {
    pub fn write_trade_log(&self, path: impl AsRef<Path>) -> Result<(), ExchangeError> {
        let wtr = csv::Writer::from_path(path)?;
        self.write_trade_log_to(wtr)
    }

    pub fn write_price_table(&self, path: impl AsRef<Path>) -> Result<(), ExchangeError> {
        let wtr = csv::Writer::from_path(path)?;
        self.write_price_table_to(wtr)
    }

    /// One row per trade, in execution order.
    pub fn write_trade_log_to<W: io::Write>(&self, mut wtr: csv::Writer<W>) -> Result<(), ExchangeError> {
        if self.trade_log().is_empty() {
            wtr.write_record(["timestamp", "instrument", "buy_agent", "sell_agent", "price", "volume"])?;
        }
        for t in self.trade_log() {
            wtr.serialize(TradeRow {
                timestamp: t.tick,
                instrument: t.instrument,
                buy_agent: t.buy_agent,
                sell_agent: t.sell_agent,
                price: t.price,
                volume: t.volume,
            })?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// One row per processed tick, one column per instrument.
    pub fn write_price_table_to<W: io::Write>(&self, mut wtr: csv::Writer<W>) -> Result<(), ExchangeError> {
        let mut header = vec!["tick".to_string()];
        header.extend((0..self.num_instruments()).map(|i| format!("instrument_{i}")));
        wtr.write_record(&header)?;

        for row in self.tick_prices() {
            let mut record = Vec::with_capacity(row.prices.len() + 1);
            record.push(row.tick.to_string());
            record.extend(row.prices.iter().map(|p| format!("{p:?}")));
            wtr.write_record(&record)?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}
