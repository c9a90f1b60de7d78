//! Domain types for tickforge

pub mod candle;
pub mod position;
pub mod signal;
pub mod tick;
pub mod trade;

pub use candle::Candle;
pub use position::{PartialFill, Position, PositionError};
pub use signal::{Direction, Signal};
pub use tick::Tick;
pub use trade::{ExitReason, TradeRecord};

/// Symbol type alias
pub type Symbol = String;
