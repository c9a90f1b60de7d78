//! Three-phase candle interpolation.
//!
//! A candle of `n` ticks walks Open→High over the first quarter, High→Low over
//! the second quarter and Low→Close over the remaining half. Phase lengths are
//! `p1 = max(1, n/4)`, `p2 = max(1, n/4)`, `p3 = n - p1 - p2`. The first two
//! phases start at their phase's start price; the last phase ends exactly on
//! the close, and that final tick is flagged as the candle close.

use chrono::Duration;

use crate::domain::{Candle, Tick};

/// Ticks per candle: whole tick intervals that fit in one candle, at least 1.
pub fn ticks_per_candle(candle_duration: Duration, tick_interval: Duration) -> usize {
    let tick_ms = tick_interval.num_milliseconds();
    if tick_ms <= 0 {
        return 1;
    }
    (candle_duration.num_milliseconds() / tick_ms).max(1) as usize
}

/// Interpolate one candle into `n` ticks stamped `timestamp + k × tick_interval`.
///
/// With fewer than three ticks there is no room for the path, so every tick
/// carries the close.
pub fn interpolate_candle(symbol: &str, candle: &Candle, n: usize, tick_interval: Duration) -> Vec<Tick> {
    if n == 0 {
        return Vec::new();
    }
    let volume = candle.volume / n as f64;
    let prices = if n < 3 { vec![candle.close; n] } else { path(candle, n) };

    let last = n - 1;
    prices
        .into_iter()
        .enumerate()
        .map(|(k, price)| Tick {
            timestamp: candle.timestamp + tick_interval * k as i32,
            price,
            volume,
            symbol: symbol.to_string(),
            is_candle_close: k == last,
        })
        .collect()
}

fn path(candle: &Candle, n: usize) -> Vec<f64> {
    let p1 = (n / 4).max(1);
    let p2 = (n / 4).max(1);
    let p3 = n - p1 - p2;

    let progress = |i: usize, p: usize| if p <= 1 { 0.0 } else { i as f64 / p as f64 };

    let mut prices = Vec::with_capacity(n);
    for i in 0..p1 {
        prices.push(candle.open + (candle.high - candle.open) * progress(i, p1));
    }
    for i in 0..p2 {
        prices.push(candle.high + (candle.low - candle.high) * progress(i, p2));
    }
    for i in 0..p3 {
        prices.push(candle.low + (candle.close - candle.low) * ((i + 1) as f64 / p3 as f64));
    }
    // a + (b - a) is not always b in floating point
    if let Some(last) = prices.last_mut() {
        *last = candle.close;
    }
    prices
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candle() -> Candle {
        Candle::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            100.0,
            102.0,
            99.0,
            101.0,
            600.0,
        )
    }

    #[test]
    fn thirty_ticks_follow_ohlc_path() {
        let ticks = interpolate_candle("X", &candle(), 30, Duration::seconds(2));
        assert_eq!(ticks.len(), 30);
        assert_eq!(ticks[0].price, 100.0);
        // phase 2 starts at the high
        assert_eq!(ticks[7].price, 102.0);
        // phase 3 starts one step above the low
        assert!(ticks[14].price > 99.0);
        assert_eq!(ticks[29].price, 101.0);
        assert!(ticks[29].is_candle_close);
        assert!(ticks[..29].iter().all(|t| !t.is_candle_close));
        let volume: f64 = ticks.iter().map(|t| t.volume).sum();
        assert!((volume - 600.0).abs() < 1e-9);
        assert!(ticks.iter().all(|t| t.price >= 99.0 && t.price <= 102.0));
    }

    #[test]
    fn timestamps_step_by_tick_interval() {
        let c = candle();
        let ticks = interpolate_candle("X", &c, 30, Duration::seconds(2));
        assert_eq!(ticks[0].timestamp, c.timestamp);
        assert_eq!(ticks[29].timestamp, c.timestamp + Duration::seconds(58));
    }

    #[test]
    fn single_tick_is_close() {
        let ticks = interpolate_candle("X", &candle(), 1, Duration::seconds(60));
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].price, 101.0);
        assert!(ticks[0].is_candle_close);
        assert_eq!(ticks[0].volume, 600.0);
    }

    #[test]
    fn degenerate_counts() {
        assert!(interpolate_candle("X", &candle(), 0, Duration::seconds(1)).is_empty());
        let ticks = interpolate_candle("X", &candle(), 2, Duration::seconds(1));
        assert_eq!(ticks.iter().map(|t| t.price).collect::<Vec<_>>(), vec![101.0, 101.0]);
    }

    #[test]
    fn close_is_exact_for_awkward_prices() {
        let c = Candle::new(candle().timestamp, 0.1, 0.7, 0.05, 0.3, 1.0);
        let ticks = interpolate_candle("X", &c, 7, Duration::seconds(1));
        assert_eq!(ticks[6].price, 0.3);
    }

    #[test]
    fn ticks_per_candle_floor() {
        assert_eq!(ticks_per_candle(Duration::seconds(60), Duration::seconds(2)), 30);
        assert_eq!(ticks_per_candle(Duration::seconds(60), Duration::seconds(7)), 8);
        assert_eq!(ticks_per_candle(Duration::seconds(1), Duration::seconds(2)), 1);
    }
}
