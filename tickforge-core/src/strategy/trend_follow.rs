//! Trend following — fast/slow EMA crossover with price confirmation.
//!
//! Only a fresh cross arms a signal; the first trend observed after warmup is
//! recorded without firing. An armed cross fires once price confirms on the
//! right side of the fast average, and is dropped if the averages cross back
//! first.
//!
//! Both averages are windowed: they are recomputed over whatever the engine's
//! `PriceHistory` currently holds, so `history_capacity` bounds their memory.

use serde::{Deserialize, Serialize};

use super::Strategy;
use crate::domain::{Direction, Position, Signal, Tick};
use crate::indicators::{ema, PriceHistory};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendFollowParams {
    pub fast_period: usize,
    pub slow_period: usize,
}

impl Default for TrendFollowParams {
    fn default() -> Self {
        Self {
            fast_period: 50,
            slow_period: 200,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrendFollowStrategy {
    params: TrendFollowParams,
    trend: Option<Direction>,
    armed: Option<Direction>,
}

impl TrendFollowStrategy {
    pub fn new(params: TrendFollowParams) -> Self {
        Self {
            params,
            trend: None,
            armed: None,
        }
    }

    fn averages(&self, prices: &[f64]) -> Option<(f64, f64)> {
        Some((ema(prices, self.params.fast_period)?, ema(prices, self.params.slow_period)?))
    }
}

fn trend_of(fast: f64, slow: f64) -> Option<Direction> {
    if fast > slow {
        Some(Direction::Long)
    } else if fast < slow {
        Some(Direction::Short)
    } else {
        None
    }
}

impl Strategy for TrendFollowStrategy {
    fn name(&self) -> &str {
        "trend_follow"
    }

    fn warmup_ticks(&self) -> usize {
        self.params.slow_period.max(self.params.fast_period)
    }

    fn on_tick(&mut self, tick: &Tick, history: &PriceHistory) -> Option<Signal> {
        let (fast, slow) = self.averages(history.prices())?;
        let trend = trend_of(fast, slow);

        if trend.is_some() && trend != self.trend {
            // the first trend after warmup is not a cross
            self.armed = if self.trend.is_some() { trend } else { None };
            self.trend = trend;
        }

        let direction = self.armed?;
        let confirmed = match direction {
            Direction::Long => tick.price > fast,
            Direction::Short => tick.price < fast,
        };
        if !confirmed {
            return None;
        }
        self.armed = None;
        let reason = format!("ema{} crossed ema{} ({fast:.4} vs {slow:.4})", self.params.fast_period, self.params.slow_period);
        Some(Signal::new(direction, tick, reason))
    }

    fn should_exit(&self, position: &Position, _tick: &Tick, history: &PriceHistory) -> bool {
        match self.averages(history.prices()) {
            Some((fast, slow)) => match position.direction {
                Direction::Long => fast < slow,
                Direction::Short => fast > slow,
            },
            None => false,
        }
    }

    fn reset(&mut self) {
        self.trend = None;
        self.armed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::{history_of, run};
    use chrono::{Duration, TimeZone, Utc};

    fn strategy() -> TrendFollowStrategy {
        TrendFollowStrategy::new(TrendFollowParams {
            fast_period: 2,
            slow_period: 4,
        })
    }

    #[test]
    fn fires_once_on_fresh_cross() {
        let mut s = strategy();
        // downtrend establishes, then a sharp rally crosses fast over slow
        let prices = [110.0, 108.0, 106.0, 104.0, 102.0, 100.0, 106.0, 112.0, 114.0, 116.0];
        let out = run(&mut s, &prices);
        let fired: Vec<_> = out.iter().enumerate().filter_map(|(i, s)| s.as_ref().map(|s| (i, s.direction))).collect();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].1, Direction::Long);
    }

    #[test]
    fn steady_trend_never_fires() {
        let mut s = strategy();
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert!(run(&mut s, &prices).iter().all(Option::is_none));
    }

    #[test]
    fn exit_on_opposite_cross() {
        let s = strategy();
        let position = Position::open("TEST", Direction::Long, 100.0, 1.0, Utc::now(), 95.0, None, "").unwrap();
        let (history, tick) = history_of(&[100.0, 102.0, 104.0, 106.0, 100.0, 94.0]);
        assert!(s.should_exit(&position, &tick, &history));
        let (history, tick) = history_of(&[100.0, 102.0, 104.0, 106.0, 108.0]);
        assert!(!s.should_exit(&position, &tick, &history));
    }

    #[test]
    fn cross_seen_while_holding_does_not_fire_after_reset() {
        let mut s = strategy();
        let mut history = PriceHistory::new(1_000);
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut clock = 0;
        let mut tick_at = |price: f64| {
            clock += 1;
            Tick::new("TEST", start + Duration::seconds(clock), price, 1.0)
        };

        let mut entries = Vec::new();
        for price in [110.0, 108.0, 106.0, 104.0, 102.0, 100.0, 106.0, 112.0, 114.0, 116.0] {
            let tick = tick_at(price);
            history.push_tick(&tick);
            entries.extend(s.on_tick(&tick, &history).map(|signal| signal.direction));
        }
        assert_eq!(entries, vec![Direction::Long]);

        // holding: prices roll over and the averages cross, strategy not consulted
        for price in [110.0, 100.0, 90.0, 85.0] {
            history.push_tick(&tick_at(price));
        }
        s.reset();

        for price in [84.0, 83.0, 82.0] {
            let tick = tick_at(price);
            history.push_tick(&tick);
            assert!(s.on_tick(&tick, &history).is_none());
        }
    }
}
