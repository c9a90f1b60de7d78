//! Tick — one processed price update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single market tick.
///
/// In replay the timestamp is engine time derived from the candle schedule;
/// in live mode it is wall-clock time at receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: f64,
    pub symbol: String,
    /// True only for the final interpolated tick of a historical candle.
    pub is_candle_close: bool,
}

impl Tick {
    pub fn new(symbol: impl Into<String>, timestamp: DateTime<Utc>, price: f64, volume: f64) -> Self {
        Self {
            timestamp,
            price,
            volume,
            symbol: symbol.into(),
            is_candle_close: false,
        }
    }

    pub fn closing(mut self) -> Self {
        self.is_candle_close = true;
        self
    }
}
