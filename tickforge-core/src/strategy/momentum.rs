//! Momentum — velocity burst confirmed by acceleration and persistence.
//!
//! A tick is a LONG candidate when velocity exceeds the arm threshold, the
//! velocity median is rising and RSI is below overbought; SHORT mirrors it.
//! Candidates must persist for `persistence_ticks` consecutive ticks before a
//! signal fires, after which the counter starts over.

use serde::{Deserialize, Serialize};

use super::Strategy;
use crate::config::EngineConfig;
use crate::domain::{Direction, Position, Signal, Tick};
use crate::indicators::{acceleration, rsi, velocity, velocity_series, PriceHistory};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumParams {
    pub velocity_threshold: f64,
    pub persistence_ticks: usize,
    pub lookback: usize,
    pub acceleration_window: usize,
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub signal_decay: bool,
}

impl MomentumParams {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            velocity_threshold: config.arm_velocity_threshold,
            persistence_ticks: config.arm_persistence_ticks,
            lookback: config.velocity_lookback_ticks,
            acceleration_window: config.acceleration_window_ticks,
            rsi_period: config.rsi_period,
            rsi_overbought: config.rsi_overbought,
            rsi_oversold: config.rsi_oversold,
            signal_decay: config.signal_decay_enabled,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MomentumStrategy {
    params: MomentumParams,
    persistence: usize,
}

impl MomentumStrategy {
    pub fn new(params: MomentumParams) -> Self {
        Self {
            params,
            persistence: 0,
        }
    }

    pub fn persistence(&self) -> usize {
        self.persistence
    }

    fn candidate(&self, prices: &[f64]) -> Option<(Direction, f64)> {
        let p = &self.params;
        let v = velocity(prices, p.lookback)?;
        let accelerating = velocity_series(prices, p.lookback, 2 * p.acceleration_window)
            .and_then(|series| acceleration(&series, p.acceleration_window))
            .unwrap_or(false);
        if !accelerating {
            return None;
        }
        // RSI only filters once it has enough history
        let rsi = rsi(prices, p.rsi_period);
        if v > p.velocity_threshold && rsi.map_or(true, |r| r < p.rsi_overbought) {
            Some((Direction::Long, v))
        } else if v < -p.velocity_threshold && rsi.map_or(true, |r| r > p.rsi_oversold) {
            Some((Direction::Short, v))
        } else {
            None
        }
    }
}

impl Strategy for MomentumStrategy {
    fn name(&self) -> &str {
        "momentum"
    }

    fn warmup_ticks(&self) -> usize {
        self.params.lookback + 2 * self.params.acceleration_window
    }

    fn on_tick(&mut self, tick: &Tick, history: &PriceHistory) -> Option<Signal> {
        let Some((direction, v)) = self.candidate(history.prices()) else {
            self.persistence = 0;
            return None;
        };
        self.persistence += 1;
        if self.persistence < self.params.persistence_ticks {
            return None;
        }
        self.persistence = 0;
        let reason = format!(
            "velocity {:.4}% accelerating for {} ticks",
            v * 100.0,
            self.params.persistence_ticks
        );
        let confidence = (v.abs() / self.params.velocity_threshold.max(f64::EPSILON) / 2.0).min(1.0);
        Some(Signal::new(direction, tick, reason).with_confidence(confidence))
    }

    /// Signal decay: velocity has reversed through the arm threshold.
    fn should_exit(&self, position: &Position, _tick: &Tick, history: &PriceHistory) -> bool {
        if !self.params.signal_decay {
            return false;
        }
        match velocity(history.prices(), self.params.lookback) {
            Some(v) => match position.direction {
                Direction::Long => v < -self.params.velocity_threshold,
                Direction::Short => v > self.params.velocity_threshold,
            },
            None => false,
        }
    }

    fn reset(&mut self) {
        self.persistence = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::{history_of, run};
    use chrono::Utc;

    fn params() -> MomentumParams {
        MomentumParams {
            velocity_threshold: 0.01,
            persistence_ticks: 2,
            lookback: 1,
            acceleration_window: 1,
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            signal_decay: true,
        }
    }

    #[test]
    fn fires_on_second_persistent_tick() {
        // velocities: 0, 0.012, 0.013
        let p2 = 100.0 * 1.012;
        let p3 = p2 * 1.013;
        let mut strategy = MomentumStrategy::new(params());
        let out = run(&mut strategy, &[100.0, 100.0, p2, p3]);
        assert!(out[..3].iter().all(Option::is_none));
        let signal = out[3].as_ref().unwrap();
        assert_eq!(signal.direction, Direction::Long);
        assert_eq!(signal.price, p3);
        assert_eq!(strategy.persistence(), 0);
    }

    #[test]
    fn counter_resets_when_candidate_lapses() {
        let mut strategy = MomentumStrategy::new(params());
        // 0.012 accel, then 0.011 (not accelerating) resets, then 0.013 accel counts 1
        let mut prices = vec![100.0, 100.0];
        for v in [0.012, 0.011, 0.013] {
            let last = *prices.last().unwrap();
            prices.push(last * (1.0 + v));
        }
        let out = run(&mut strategy, &prices);
        assert!(out.iter().all(Option::is_none));
        assert_eq!(strategy.persistence(), 1);
    }

    #[test]
    fn short_candidates_mirror_longs() {
        let p2 = 100.0 * (1.0 - 0.012);
        let p3 = p2 * (1.0 - 0.020);
        // falling velocities are decelerating in the directional sense
        let mut strategy = MomentumStrategy::new(params());
        let out = run(&mut strategy, &[100.0, 100.0, p2, p3]);
        assert!(out.iter().all(Option::is_none));

        // a rebound from a deep drop is accelerating while still below -threshold
        let p2 = 100.0 * (1.0 - 0.05);
        let p3 = p2 * (1.0 - 0.03);
        let p4 = p3 * (1.0 - 0.02);
        let mut strategy = MomentumStrategy::new(params());
        let out = run(&mut strategy, &[100.0, p2, p3, p4]);
        let signal = out[3].as_ref().unwrap();
        assert_eq!(signal.direction, Direction::Short);
    }

    #[test]
    fn overbought_rsi_blocks_longs() {
        let mut p = params();
        p.rsi_period = 2;
        let p2 = 100.0 * 1.012;
        let p3 = p2 * 1.013;
        let mut strategy = MomentumStrategy::new(p);
        let out = run(&mut strategy, &[100.0, 100.0, p2, p3]);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn decay_exit_on_reversal() {
        let strategy = MomentumStrategy::new(params());
        let (history, tick) = history_of(&[100.0, 98.0]);
        let position = Position::open("TEST", Direction::Long, 100.0, 1.0, Utc::now(), 99.0, None, "").unwrap();
        assert!(strategy.should_exit(&position, &tick, &history));

        let (history, tick) = history_of(&[100.0, 99.5]);
        assert!(!strategy.should_exit(&position, &tick, &history));
    }
}
