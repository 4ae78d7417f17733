use order_book::{BookError, DEFAULT_INITIAL_PRICE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What an exchange does with the cluster-wide price vector after each round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalViewPolicy {
    /// Local prices stay authoritative; the aggregate is discarded.
    #[default]
    Ignore,
    /// Keep the latest aggregate for reporting. Matching never reads it.
    Record,
}

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub replica: u32,
    pub num_instruments: usize,
    pub initial_price: f64,
    pub global_view: GlobalViewPolicy,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            replica: 0,
            num_instruments: 3,
            initial_price: DEFAULT_INITIAL_PRICE,
            global_view: GlobalViewPolicy::Ignore,
        }
    }
}

impl ExchangeConfig {
    pub fn validate(&self) -> Result<(), ExchangeError> {
        if self.num_instruments == 0 {
            return Err(ExchangeError::NoInstruments);
        }
        if self.num_instruments > u32::MAX as usize {
            return Err(ExchangeError::TooManyInstruments(self.num_instruments));
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("exchange needs at least one instrument")]
    NoInstruments,

    #[error("instrument count {0} does not fit an instrument id")]
    TooManyInstruments(usize),

    #[error("book configuration rejected: {0}")]
    Book(#[from] BookError),

    #[error("global view has {got} prices, exchange has {expected} instruments")]
    ViewLength { expected: usize, got: usize },

    #[error("export failed: {0}")]
    Export(#[from] csv::Error),
}
