//! Trade signals emitted by strategies.
//!
//! A signal is produced, consumed and discarded within one tick. It describes
//! the market event; admission and sizing happen downstream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Tick;

/// Directional intent of a signal or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1.0 for longs, -1.0 for shorts. Multiplies a raw price move into PnL.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }
}

/// A directional trade signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub direction: Direction,
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub reason: String,
    /// Absolute stop price. When absent the risk engine derives one from ATR.
    pub stop_loss: Option<f64>,
    /// Absolute target price.
    pub take_profit: Option<f64>,
    /// Conviction in [0, 1].
    pub confidence: f64,
}

impl Signal {
    pub fn new(direction: Direction, tick: &Tick, reason: impl Into<String>) -> Self {
        Self {
            direction,
            symbol: tick.symbol.clone(),
            timestamp: tick.timestamp,
            price: tick.price,
            reason: reason.into(),
            stop_loss: None,
            take_profit: None,
            confidence: 1.0,
        }
    }

    pub fn with_stops(mut self, stop_loss: f64, take_profit: f64) -> Self {
        self.stop_loss = Some(stop_loss);
        self.take_profit = Some(take_profit);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn direction_sign_and_opposite() {
        assert_eq!(Direction::Long.sign(), 1.0);
        assert_eq!(Direction::Short.sign(), -1.0);
        assert_eq!(Direction::Long.opposite(), Direction::Short);
    }

    #[test]
    fn signal_copies_tick_context() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let tick = Tick::new("BTCUSDT", ts, 101.5, 3.0);
        let signal = Signal::new(Direction::Short, &tick, "test")
            .with_stops(103.0, 99.0)
            .with_confidence(1.7);
        assert_eq!(signal.symbol, "BTCUSDT");
        assert_eq!(signal.timestamp, ts);
        assert_eq!(signal.price, 101.5);
        assert_eq!(signal.stop_loss, Some(103.0));
        assert_eq!(signal.confidence, 1.0);
    }

    #[test]
    fn direction_serializes_upper_case() {
        let json = serde_json::to_string(&Direction::Long).unwrap();
        assert_eq!(json, "\"LONG\"");
    }
}
