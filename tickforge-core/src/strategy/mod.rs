//! Strategies — pluggable signal generators.
//!
//! A strategy sees one tick at a time plus the engine's rolling history and
//! returns at most one directional signal. It never sees equity, allocation
//! or lifecycle state; the engine only consults it while waiting for an entry
//! and, while holding, for an optional discretionary exit.

pub mod breakout;
pub mod factory;
pub mod mean_reversion;
pub mod momentum;
pub mod scalping;
pub mod trend_follow;

use crate::domain::{Position, Signal, Tick};
use crate::indicators::PriceHistory;

pub use breakout::{BreakoutParams, BreakoutStrategy};
pub use factory::{create_strategy, StrategyConfig};
pub use mean_reversion::{MeanReversionParams, MeanReversionStrategy};
pub use momentum::{MomentumParams, MomentumStrategy};
pub use scalping::{ScalpingParams, ScalpingStrategy};
pub use trend_follow::{TrendFollowParams, TrendFollowStrategy};

pub trait Strategy: Send {
    /// Stable identifier, also used as the allocator's strategy key.
    fn name(&self) -> &str;

    /// Ticks of history needed before the strategy can emit anything.
    fn warmup_ticks(&self) -> usize;

    /// Evaluate the latest tick. `history` already contains it.
    fn on_tick(&mut self, tick: &Tick, history: &PriceHistory) -> Option<Signal>;

    /// Discretionary exit, checked after the risk engine's own exits.
    fn should_exit(&self, _position: &Position, _tick: &Tick, _history: &PriceHistory) -> bool {
        false
    }

    /// Drop any accumulated internal state. The engine calls this whenever
    /// a position closes, since `on_tick` is not consulted while holding.
    fn reset(&mut self) {}
}
