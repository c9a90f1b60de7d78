//! Breakout — price escapes the range of the previous `lookback` ticks.

use serde::{Deserialize, Serialize};

use super::Strategy;
use crate::domain::{Direction, Signal, Tick};
use crate::indicators::{rolling_extremes, PriceHistory};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutParams {
    pub lookback: usize,
}

impl Default for BreakoutParams {
    fn default() -> Self {
        Self { lookback: 50 }
    }
}

#[derive(Debug, Clone)]
pub struct BreakoutStrategy {
    params: BreakoutParams,
}

impl BreakoutStrategy {
    pub fn new(params: BreakoutParams) -> Self {
        Self { params }
    }
}

impl Strategy for BreakoutStrategy {
    fn name(&self) -> &str {
        "breakout"
    }

    fn warmup_ticks(&self) -> usize {
        self.params.lookback + 1
    }

    fn on_tick(&mut self, tick: &Tick, history: &PriceHistory) -> Option<Signal> {
        let (high, low) = rolling_extremes(history.prices(), self.params.lookback)?;
        if tick.price > high {
            Some(Signal::new(Direction::Long, tick, format!("broke {}-tick high {high:.4}", self.params.lookback)))
        } else if tick.price < low {
            Some(Signal::new(Direction::Short, tick, format!("broke {}-tick low {low:.4}", self.params.lookback)))
        } else {
            None
        }
    }
}
