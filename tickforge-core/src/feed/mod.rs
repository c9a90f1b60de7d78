//! Tick sources.
//!
//! Historical replay interpolates candles into sub-candle ticks with no
//! randomness and no wall-clock waits; live mode passes price snapshots
//! through one-for-one. The engine does not know which kind it is fed.

pub mod historical;
pub mod interpolate;
pub mod live;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::Tick;

pub use historical::HistoricalFeed;
pub use interpolate::{interpolate_candle, ticks_per_candle};
pub use live::{LiveFeed, PriceSnapshot};

/// Invalid feed construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeedError {
    #[error("tick interval must be positive, got {0} ms")]
    NonPositiveTickInterval(i64),

    #[error("candle duration {candle_ms} ms is shorter than tick interval {tick_ms} ms")]
    CandleShorterThanTick { candle_ms: i64, tick_ms: i64 },

    #[error("candles out of order at index {index}")]
    Unordered { index: usize },
}

/// A source of ticks for one instrument.
pub trait MarketDataSource: Send {
    /// Next tick, or `None` if nothing is available right now.
    ///
    /// For live sources `None` is a gap, not the end of data; check
    /// [`has_more_data`](Self::has_more_data) to tell the two apart.
    fn get_next_tick(&mut self) -> Option<Tick>;

    /// Source time: the last emitted tick's timestamp in replay, wall-clock live.
    fn get_current_time(&self) -> DateTime<Utc>;

    fn has_more_data(&self) -> bool;

    /// Release any resources held by the source.
    fn cleanup(&mut self) {}
}
