//! PriceHistory — the bounded rolling window an engine accumulates per tick.
//!
//! Backed by plain vectors that are compacted once they reach twice the
//! capacity, so every accessor can hand out a contiguous slice of the most
//! recent `capacity` samples without reallocating on each push.

use crate::domain::Tick;

#[derive(Debug, Clone)]
pub struct PriceHistory {
    capacity: usize,
    prices: Vec<f64>,
    highs: Vec<f64>,
    lows: Vec<f64>,
    volumes: Vec<f64>,
}

impl PriceHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            prices: Vec::with_capacity(capacity * 2),
            highs: Vec::with_capacity(capacity * 2),
            lows: Vec::with_capacity(capacity * 2),
            volumes: Vec::with_capacity(capacity * 2),
        }
    }

    /// Record a tick. A tick carries a single price, so it is also its own
    /// high, low and close for true-range purposes.
    pub fn push_tick(&mut self, tick: &Tick) {
        self.push(tick.price, tick.price, tick.price, tick.volume);
    }

    pub fn push(&mut self, close: f64, high: f64, low: f64, volume: f64) {
        if self.prices.len() >= self.capacity * 2 {
            let excess = self.prices.len() - self.capacity + 1;
            self.prices.drain(..excess);
            self.highs.drain(..excess);
            self.lows.drain(..excess);
            self.volumes.drain(..excess);
        }
        self.prices.push(close);
        self.highs.push(high);
        self.lows.push(low);
        self.volumes.push(volume);
    }

    fn window<'a>(&self, series: &'a [f64]) -> &'a [f64] {
        &series[series.len().saturating_sub(self.capacity)..]
    }

    /// Closing prices, oldest first, at most `capacity` long.
    pub fn prices(&self) -> &[f64] {
        self.window(&self.prices)
    }

    pub fn highs(&self) -> &[f64] {
        self.window(&self.highs)
    }

    pub fn lows(&self) -> &[f64] {
        self.window(&self.lows)
    }

    pub fn volumes(&self) -> &[f64] {
        self.window(&self.volumes)
    }

    pub fn last_price(&self) -> Option<f64> {
        self.prices.last().copied()
    }

    pub fn len(&self) -> usize {
        self.prices().len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.prices.clear();
        self.highs.clear();
        self.lows.clear();
        self.volumes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let mut history = PriceHistory::new(3);
        for i in 0..10 {
            history.push(i as f64, i as f64 + 0.5, i as f64 - 0.5, 1.0);
        }
        assert_eq!(history.prices(), &[7.0, 8.0, 9.0]);
        assert_eq!(history.highs(), &[7.5, 8.5, 9.5]);
        assert_eq!(history.lows(), &[6.5, 7.5, 8.5]);
        assert_eq!(history.len(), 3);
        assert_eq!(history.last_price(), Some(9.0));
    }

    #[test]
    fn window_stays_bounded_across_compaction() {
        let mut history = PriceHistory::new(4);
        for i in 0..1_000 {
            history.push(i as f64, i as f64, i as f64, 0.0);
            assert!(history.len() <= 4);
            assert_eq!(history.last_price(), Some(i as f64));
        }
        assert_eq!(history.prices(), &[996.0, 997.0, 998.0, 999.0]);
    }

    #[test]
    fn partial_window_before_capacity() {
        let mut history = PriceHistory::new(10);
        history.push(1.0, 1.0, 1.0, 5.0);
        history.push(2.0, 2.0, 2.0, 6.0);
        assert_eq!(history.prices(), &[1.0, 2.0]);
        assert_eq!(history.volumes(), &[5.0, 6.0]);
        history.clear();
        assert!(history.is_empty());
    }
}
