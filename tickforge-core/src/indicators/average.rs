//! Moving averages and dispersion.

/// Arithmetic mean of the whole slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Simple moving average of the last `period` values.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    mean(&values[values.len() - period..])
}

/// Exponential moving average over the whole slice.
///
/// Seeded with the SMA of the first `period` values, then smoothed with
/// alpha = 2 / (period + 1). This is a windowed EMA: once a bounded history
/// starts evicting, the seed moves with the window and the value differs from
/// an EMA carried since the first sample.
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let seed = mean(&values[..period])?;
    Some(
        values[period..]
            .iter()
            .fold(seed, |acc, &v| alpha * v + (1.0 - alpha) * acc),
    )
}

/// Sample standard deviation of the last `period` values.
pub fn std_dev(values: &[f64], period: usize) -> Option<f64> {
    if period < 2 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    let m = mean(window)?;
    let var = window.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (period - 1) as f64;
    Some(var.sqrt())
}
