//! Relative Strength Index (RSI).
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss), with gains and losses
//! averaged over the last `period` price changes.
//! Edge case: avg_loss == 0 → RSI = 100 (including a flat window).

pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }
    let window = &prices[prices.len() - period - 1..];
    let (mut gain, mut loss) = (0.0, 0.0);
    for pair in window.windows(2) {
        let change = pair[1] - pair[0];
        if change.is_nan() {
            return None;
        }
        if change > 0.0 {
            gain += change;
        } else {
            loss -= change;
        }
    }
    let avg_gain = gain / period as f64;
    let avg_loss = loss / period as f64;
    if avg_loss == 0.0 {
        return Some(100.0);
    }
    Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn rsi_all_gains() {
        let prices = [100.0, 101.0, 102.0, 103.0];
        assert_approx(rsi(&prices, 3).unwrap(), 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_all_losses() {
        let prices = [103.0, 102.0, 101.0, 100.0];
        assert_approx(rsi(&prices, 3).unwrap(), 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_flat_window_is_100() {
        assert_approx(rsi(&[50.0; 6], 5).unwrap(), 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_mixed_changes() {
        // changes: +2, -1, +1, -2 → avg_gain 0.75, avg_loss 0.75 → 50
        let prices = [100.0, 102.0, 101.0, 102.0, 100.0];
        assert_approx(rsi(&prices, 4).unwrap(), 50.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_uses_only_last_period() {
        // the early crash is outside the window
        let prices = [200.0, 100.0, 101.0, 102.0];
        assert_approx(rsi(&prices, 2).unwrap(), 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_unavailable_when_short() {
        assert_eq!(rsi(&[1.0, 2.0], 2), None);
    }
}
