//! Price bands: Bollinger and rolling extremes.

use super::average::{sma, std_dev};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Middle = SMA(period), upper/lower = middle ± k × sample std dev.
pub fn bollinger_bands(prices: &[f64], period: usize, k: f64) -> Option<BollingerBands> {
    let middle = sma(prices, period)?;
    let sd = std_dev(prices, period)?;
    Some(BollingerBands {
        upper: middle + k * sd,
        middle,
        lower: middle - k * sd,
    })
}

/// Highest and lowest of the `lookback` values preceding the last one.
///
/// The current value is excluded so a breakout compares against the range
/// it is breaking out of.
pub fn rolling_extremes(prices: &[f64], lookback: usize) -> Option<(f64, f64)> {
    if lookback == 0 || prices.len() < lookback + 1 {
        return None;
    }
    let end = prices.len() - 1;
    let window = &prices[end - lookback..end];
    let high = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let low = window.iter().copied().fold(f64::INFINITY, f64::min);
    Some((high, low))
}
