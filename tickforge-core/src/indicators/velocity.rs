//! Velocity and acceleration.
//!
//! Velocity is the fractional price change over `lookback` ticks:
//! `(p[-1] - p[-1-lookback]) / p[-1-lookback]`.
//!
//! Acceleration is directional: the median of the most recent `window`
//! velocities must strictly exceed the median of the `window` before it.
//! Medians keep a single outlier tick from flipping the result.

/// Fractional change over the last `lookback` ticks.
pub fn velocity(prices: &[f64], lookback: usize) -> Option<f64> {
    if lookback == 0 || prices.len() < lookback + 1 {
        return None;
    }
    let current = prices[prices.len() - 1];
    let past = prices[prices.len() - 1 - lookback];
    if past == 0.0 || past.is_nan() || current.is_nan() {
        return None;
    }
    Some((current - past) / past)
}

/// The last `count` velocities, oldest first, each computed over `lookback`.
pub fn velocity_series(prices: &[f64], lookback: usize, count: usize) -> Option<Vec<f64>> {
    if count == 0 || prices.len() < lookback + count {
        return None;
    }
    let end = prices.len();
    (end - count + 1..=end)
        .map(|stop| velocity(&prices[..stop], lookback))
        .collect()
}

/// True iff median(last `window`) > median(previous `window`).
pub fn acceleration(velocities: &[f64], window: usize) -> Option<bool> {
    if window == 0 || velocities.len() < window * 2 {
        return None;
    }
    let n = velocities.len();
    let last = median(&velocities[n - window..])?;
    let prev = median(&velocities[n - 2 * window..n - window])?;
    Some(last > prev)
}

/// Median of a slice. NaN-free input is assumed; NaN sorts last.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
