//! Mean reversion — fade Bollinger band extremes confirmed by RSI.
//!
//! LONG when price closes below the lower band with RSI oversold, SHORT when
//! above the upper band with RSI overbought. Exits once price reverts through
//! the middle band.

use serde::{Deserialize, Serialize};

use super::Strategy;
use crate::domain::{Direction, Position, Signal, Tick};
use crate::indicators::{bollinger_bands, rsi, PriceHistory};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanReversionParams {
    pub period: usize,
    pub std_multiplier: f64,
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
}

impl Default for MeanReversionParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_multiplier: 2.0,
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MeanReversionStrategy {
    params: MeanReversionParams,
}

impl MeanReversionStrategy {
    pub fn new(params: MeanReversionParams) -> Self {
        Self { params }
    }
}

impl Strategy for MeanReversionStrategy {
    fn name(&self) -> &str {
        "mean_reversion"
    }

    fn warmup_ticks(&self) -> usize {
        self.params.period.max(self.params.rsi_period + 1)
    }

    fn on_tick(&mut self, tick: &Tick, history: &PriceHistory) -> Option<Signal> {
        let p = &self.params;
        let prices = history.prices();
        let bands = bollinger_bands(prices, p.period, p.std_multiplier)?;
        let rsi = rsi(prices, p.rsi_period)?;

        if tick.price < bands.lower && rsi < p.rsi_oversold {
            let reason = format!("price below lower band {:.4}, rsi {:.1}", bands.lower, rsi);
            Some(Signal::new(Direction::Long, tick, reason))
        } else if tick.price > bands.upper && rsi > p.rsi_overbought {
            let reason = format!("price above upper band {:.4}, rsi {:.1}", bands.upper, rsi);
            Some(Signal::new(Direction::Short, tick, reason))
        } else {
            None
        }
    }

    fn should_exit(&self, position: &Position, tick: &Tick, history: &PriceHistory) -> bool {
        let Some(bands) = bollinger_bands(history.prices(), self.params.period, self.params.std_multiplier) else {
            return false;
        };
        match position.direction {
            Direction::Long => tick.price >= bands.middle,
            Direction::Short => tick.price <= bands.middle,
        }
    }
}
