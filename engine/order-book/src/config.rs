use thiserror::Error;

use crate::InstrumentId;

/// Last price of a book before any trade has executed
pub const DEFAULT_INITIAL_PRICE: f64 = 100.0;

#[derive(Clone, Copy, Debug)]
pub struct BookConfig {
    pub instrument: InstrumentId,
    pub initial_price: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookError {
    #[error("initial price {0} must be finite and positive")]
    InvalidInitialPrice(f64),
}

impl Default for BookConfig {
    fn default() -> Self {
        Self { instrument: 0, initial_price: DEFAULT_INITIAL_PRICE }
    }
}

impl BookConfig {
    pub fn new(instrument: InstrumentId, initial_price: f64) -> Self {
        Self { instrument, initial_price }
    }

    pub fn validate(&self) -> Result<(), BookError> {
        if !self.initial_price.is_finite() || self.initial_price <= 0.0 {
            return Err(BookError::InvalidInitialPrice(self.initial_price));
        }
        Ok(())
    }
}
