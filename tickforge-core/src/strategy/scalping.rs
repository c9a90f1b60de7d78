//! Scalping — short-window velocity burst with a tight fixed bracket.

use serde::{Deserialize, Serialize};

use super::Strategy;
use crate::domain::{Direction, Signal, Tick};
use crate::indicators::{velocity, PriceHistory};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalpingParams {
    pub lookback: usize,
    pub velocity_threshold: f64,
    pub stop_pct: f64,
    pub target_pct: f64,
}

impl Default for ScalpingParams {
    fn default() -> Self {
        Self {
            lookback: 5,
            velocity_threshold: 0.0005,
            stop_pct: 0.005,
            target_pct: 0.005,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScalpingStrategy {
    params: ScalpingParams,
}

impl ScalpingStrategy {
    pub fn new(params: ScalpingParams) -> Self {
        Self { params }
    }
}

impl Strategy for ScalpingStrategy {
    fn name(&self) -> &str {
        "scalping"
    }

    fn warmup_ticks(&self) -> usize {
        self.params.lookback + 1
    }

    fn on_tick(&mut self, tick: &Tick, history: &PriceHistory) -> Option<Signal> {
        let p = &self.params;
        let v = velocity(history.prices(), p.lookback)?;
        let direction = if v > p.velocity_threshold {
            Direction::Long
        } else if v < -p.velocity_threshold {
            Direction::Short
        } else {
            return None;
        };
        let sign = direction.sign();
        let stop = tick.price * (1.0 - sign * p.stop_pct);
        let target = tick.price * (1.0 + sign * p.target_pct);
        Some(Signal::new(direction, tick, format!("scalp burst {:.4}%", v * 100.0)).with_stops(stop, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::run;

    #[test]
    fn burst_carries_fixed_bracket() {
        let mut s = ScalpingStrategy::new(ScalpingParams {
            lookback: 2,
            ..ScalpingParams::default()
        });
        let out = run(&mut s, &[100.0, 100.0, 100.1]);
        let signal = out[2].as_ref().unwrap();
        assert_eq!(signal.direction, Direction::Long);
        assert!((signal.stop_loss.unwrap() - 100.1 * 0.995).abs() < 1e-9);
        assert!((signal.take_profit.unwrap() - 100.1 * 1.005).abs() < 1e-9);
    }

    #[test]
    fn short_bracket_is_inverted() {
        let mut s = ScalpingStrategy::new(ScalpingParams {
            lookback: 1,
            ..ScalpingParams::default()
        });
        let out = run(&mut s, &[100.0, 99.9]);
        let signal = out[1].as_ref().unwrap();
        assert_eq!(signal.direction, Direction::Short);
        assert!(signal.stop_loss.unwrap() > 99.9);
        assert!(signal.take_profit.unwrap() < 99.9);
    }

    #[test]
    fn small_moves_are_ignored() {
        let mut s = ScalpingStrategy::new(ScalpingParams::default());
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + 0.001 * i as f64).collect();
        assert!(run(&mut s, &prices).iter().all(Option::is_none));
    }
}
