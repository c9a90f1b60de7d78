//! Historical replay source: candles pre-expanded into a fixed tick sequence.

use chrono::{DateTime, Duration, Utc};

use super::{interpolate_candle, ticks_per_candle, FeedError, MarketDataSource};
use crate::domain::{Candle, Tick};

/// Deterministic replay over an ordered candle series.
///
/// All ticks are generated up front, so two feeds built from the same candles
/// and intervals yield identical sequences.
#[derive(Debug, Clone)]
pub struct HistoricalFeed {
    ticks: Vec<Tick>,
    cursor: usize,
    start_time: DateTime<Utc>,
}

impl HistoricalFeed {
    pub fn new(
        symbol: &str,
        candles: &[Candle],
        tick_interval: Duration,
        candle_duration: Duration,
    ) -> Result<Self, FeedError> {
        let tick_ms = tick_interval.num_milliseconds();
        if tick_ms <= 0 {
            return Err(FeedError::NonPositiveTickInterval(tick_ms));
        }
        let candle_ms = candle_duration.num_milliseconds();
        if candle_ms < tick_ms {
            return Err(FeedError::CandleShorterThanTick { candle_ms, tick_ms });
        }
        if let Some(index) = candles
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(FeedError::Unordered { index: index + 1 });
        }

        let n = ticks_per_candle(candle_duration, tick_interval);
        let ticks = candles
            .iter()
            .flat_map(|candle| interpolate_candle(symbol, candle, n, tick_interval))
            .collect();
        let start_time = candles
            .first()
            .map(|c| c.timestamp)
            .unwrap_or_default();

        Ok(Self {
            ticks,
            cursor: 0,
            start_time,
        })
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.ticks.len() - self.cursor
    }
}

impl MarketDataSource for HistoricalFeed {
    fn get_next_tick(&mut self) -> Option<Tick> {
        let tick = self.ticks.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(tick)
    }

    fn get_current_time(&self) -> DateTime<Utc> {
        match self.cursor {
            0 => self.start_time,
            c => self.ticks[c - 1].timestamp,
        }
    }

    fn has_more_data(&self) -> bool {
        self.cursor < self.ticks.len()
    }

    fn cleanup(&mut self) {
        self.cursor = self.ticks.len();
    }
}
