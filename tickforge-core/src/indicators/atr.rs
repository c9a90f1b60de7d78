//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR is the simple mean of the last `period` true ranges, so it needs
//! `period + 1` samples (every TR needs a previous close).

/// True Range series. Element `i` pairs sample `i + 1` with close `i`, so the
/// result is one shorter than the input.
pub fn true_range(highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<f64> {
    let n = highs.len().min(lows.len()).min(closes.len());
    (1..n)
        .map(|i| {
            let (h, l, pc) = (highs[i], lows[i], closes[i - 1]);
            (h - l).max((h - pc).abs()).max((l - pc).abs())
        })
        .collect()
}

/// Mean true range over the last `period` samples.
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Option<f64> {
    let n = highs.len().min(lows.len()).min(closes.len());
    if period == 0 || n < period + 1 {
        return None;
    }
    let start = n - period - 1;
    let tr = true_range(&highs[start..n], &lows[start..n], &closes[start..n]);
    let value = tr.iter().sum::<f64>() / period as f64;
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn true_range_uses_previous_close() {
        let highs = [10.0, 12.0, 11.0];
        let lows = [9.0, 10.5, 8.0];
        let closes = [9.5, 11.0, 10.0];
        let tr = true_range(&highs, &lows, &closes);
        // 12 - 9.5 = 2.5 beats 12 - 10.5
        assert_approx(tr[0], 2.5, DEFAULT_EPSILON);
        // 11 - 8 = 3
        assert_approx(tr[1], 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_is_simple_mean_of_last_period() {
        let highs = [10.0, 12.0, 11.0];
        let lows = [9.0, 10.5, 8.0];
        let closes = [9.5, 11.0, 10.0];
        assert_approx(atr(&highs, &lows, &closes, 2).unwrap(), 2.75, DEFAULT_EPSILON);
        assert_approx(atr(&highs, &lows, &closes, 1).unwrap(), 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_on_tick_prices_is_mean_absolute_change() {
        let prices = [100.0, 101.0, 99.0, 102.0];
        let value = atr(&prices, &prices, &prices, 3).unwrap();
        assert_approx(value, (1.0 + 2.0 + 3.0) / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_unavailable_when_short() {
        let p = [1.0, 2.0];
        assert_eq!(atr(&p, &p, &p, 2), None);
        assert_eq!(atr(&p, &p, &p, 0), None);
    }
}
