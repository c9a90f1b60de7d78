//! Indicator library.
//!
//! Every indicator is a pure function over a window of history and returns
//! `None` when the window is too short. Callers treat `None` as "no signal",
//! never as a fault. The only stateful piece is [`PriceHistory`], the bounded
//! rolling window each engine owns.

pub mod atr;
pub mod average;
pub mod bands;
pub mod history;
pub mod regime;
pub mod rsi;
pub mod velocity;

pub use atr::{atr, true_range};
pub use average::{ema, mean, sma, std_dev};
pub use bands::{bollinger_bands, rolling_extremes, BollingerBands};
pub use history::PriceHistory;
pub use regime::{classify_regime, Regime};
pub use rsi::rsi;
pub use velocity::{acceleration, median, velocity, velocity_series};

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
