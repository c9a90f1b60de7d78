//! Market regime classification.
//!
//! VOLATILE when ATR exceeds 2% of the current price; otherwise TRENDING when
//! the least-squares slope of the last `lookback` prices, as a fraction of
//! their mean, exceeds 0.1% per tick; otherwise RANGING. Too little data is
//! RANGING. `Unknown` is only ever produced by external regime providers.

use serde::{Deserialize, Serialize};

use super::average::mean;

const VOLATILE_ATR_PCT: f64 = 0.02;
const TRENDING_SLOPE_PCT: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Regime {
    Trending,
    Ranging,
    Volatile,
    #[default]
    Unknown,
}

pub fn classify_regime(prices: &[f64], atr: Option<f64>, lookback: usize) -> Regime {
    if lookback < 2 || prices.len() < lookback {
        return Regime::Ranging;
    }
    let window = &prices[prices.len() - lookback..];
    let current = window[window.len() - 1];

    if let Some(atr) = atr {
        if current > 0.0 && atr / current > VOLATILE_ATR_PCT {
            return Regime::Volatile;
        }
    }

    let Some(y_mean) = mean(window) else {
        return Regime::Ranging;
    };
    if y_mean == 0.0 {
        return Regime::Ranging;
    }
    let x_mean = (lookback - 1) as f64 / 2.0;
    let (num, den) = window
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, &y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });
    let slope_pct = num / den / y_mean;
    if slope_pct.abs() > TRENDING_SLOPE_PCT {
        Regime::Trending
    } else {
        Regime::Ranging
    }
}
