//! Position — the single open trade an engine manages.
//!
//! A position is created at entry, mutated on every HOLD tick (excursion
//! tracking, trailing ratchet, partial take) and consumed at exit. Stop-side
//! geometry is validated at construction so a position can never exist with
//! its protective stop on the wrong side of entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Direction;

/// Invalid position geometry or lifecycle misuse.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    #[error("position quantity must be positive, got {0}")]
    NonPositiveQuantity(f64),

    #[error("entry price must be positive and finite, got {0}")]
    InvalidEntryPrice(f64),

    #[error("stop {stop} is not below/above entry {entry} for a {direction:?} position")]
    StopWrongSide {
        direction: Direction,
        entry: f64,
        stop: f64,
    },

    #[error("take-profit {target} is not above/below entry {entry} for a {direction:?} position")]
    TargetWrongSide {
        direction: Direction,
        entry: f64,
        target: f64,
    },

    #[error("a position is already open for {0}")]
    AlreadyOpen(String),
}

/// Result of a one-shot partial close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartialFill {
    /// Raw market price that triggered the partial.
    pub trigger_price: f64,
    /// Price after slippage.
    pub execution_price: f64,
    /// Fraction of the original quantity closed.
    pub fraction_closed: f64,
    pub gross_pnl: f64,
    pub fee: f64,
    pub slippage: f64,
    /// Protective stop after the breakeven move.
    pub stop_loss_price: f64,
}

/// The engine's open trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub direction: Direction,
    /// Execution price of the entry fill (slippage included).
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    /// Original quantity in instrument units.
    pub quantity: f64,
    pub stop_loss_price: f64,
    pub take_profit_price: Option<f64>,
    pub highest_price: f64,
    pub lowest_price: f64,
    pub trailing_stop_price: Option<f64>,
    pub partial_taken: bool,
    /// Fraction of `quantity` still open, in (0, 1].
    pub remaining_size: f64,
    /// Gross PnL already booked by partial closes.
    pub realized_pnl: f64,
    pub fees_paid: f64,
    pub slippage_cost: f64,
    pub entry_reason: String,
}

impl Position {
    /// Open a position, validating stop and target placement.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        symbol: impl Into<String>,
        direction: Direction,
        entry_price: f64,
        quantity: f64,
        entry_time: DateTime<Utc>,
        stop_loss_price: f64,
        take_profit_price: Option<f64>,
        entry_reason: impl Into<String>,
    ) -> Result<Self, PositionError> {
        if !entry_price.is_finite() || entry_price <= 0.0 {
            return Err(PositionError::InvalidEntryPrice(entry_price));
        }
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(PositionError::NonPositiveQuantity(quantity));
        }
        let stop_ok = match direction {
            Direction::Long => stop_loss_price < entry_price,
            Direction::Short => stop_loss_price > entry_price,
        };
        if !stop_ok || !stop_loss_price.is_finite() {
            return Err(PositionError::StopWrongSide {
                direction,
                entry: entry_price,
                stop: stop_loss_price,
            });
        }
        if let Some(target) = take_profit_price {
            let target_ok = match direction {
                Direction::Long => target > entry_price,
                Direction::Short => target < entry_price,
            };
            if !target_ok {
                return Err(PositionError::TargetWrongSide {
                    direction,
                    entry: entry_price,
                    target,
                });
            }
        }

        Ok(Self {
            symbol: symbol.into(),
            direction,
            entry_price,
            entry_time,
            quantity,
            stop_loss_price,
            take_profit_price,
            highest_price: entry_price,
            lowest_price: entry_price,
            trailing_stop_price: None,
            partial_taken: false,
            remaining_size: 1.0,
            realized_pnl: 0.0,
            fees_paid: 0.0,
            slippage_cost: 0.0,
            entry_reason: entry_reason.into(),
        })
    }

    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }

    /// Quantity still open, in instrument units.
    pub fn open_quantity(&self) -> f64 {
        self.quantity * self.remaining_size
    }

    /// Notional of the original entry.
    pub fn entry_notional(&self) -> f64 {
        self.entry_price * self.quantity
    }

    /// Extend the running high/low with a new observed price.
    pub fn mark(&mut self, price: f64) {
        if price > self.highest_price {
            self.highest_price = price;
        }
        if price < self.lowest_price {
            self.lowest_price = price;
        }
    }

    /// Maximum favorable excursion as a fraction of entry.
    pub fn favorable_excursion(&self) -> f64 {
        match self.direction {
            Direction::Long => (self.highest_price - self.entry_price) / self.entry_price,
            Direction::Short => (self.entry_price - self.lowest_price) / self.entry_price,
        }
    }

    /// Maximum adverse excursion as a fraction of entry (non-negative).
    pub fn adverse_excursion(&self) -> f64 {
        match self.direction {
            Direction::Long => ((self.entry_price - self.lowest_price) / self.entry_price).max(0.0),
            Direction::Short => ((self.highest_price - self.entry_price) / self.entry_price).max(0.0),
        }
    }

    /// Gross PnL of the open remainder at `price`.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.direction.sign() * self.open_quantity()
    }

    /// Move the trailing stop toward `candidate` if that tightens it.
    ///
    /// Longs only ratchet up, shorts only ratchet down. Returns true when the
    /// level changed.
    pub fn ratchet_trailing(&mut self, candidate: f64) -> bool {
        let tighter = match (self.trailing_stop_price, self.direction) {
            (None, _) => true,
            (Some(current), Direction::Long) => candidate > current,
            (Some(current), Direction::Short) => candidate < current,
        };
        if tighter {
            self.trailing_stop_price = Some(candidate);
        }
        tighter
    }

    /// Move the hard stop to `candidate` only if that tightens it.
    pub fn tighten_stop(&mut self, candidate: f64) -> bool {
        let tighter = match self.direction {
            Direction::Long => candidate > self.stop_loss_price,
            Direction::Short => candidate < self.stop_loss_price,
        };
        if tighter {
            self.stop_loss_price = candidate;
        }
        tighter
    }

    pub fn stop_hit(&self, price: f64) -> bool {
        match self.direction {
            Direction::Long => price <= self.stop_loss_price,
            Direction::Short => price >= self.stop_loss_price,
        }
    }

    pub fn trailing_hit(&self, price: f64) -> bool {
        match (self.trailing_stop_price, self.direction) {
            (None, _) => false,
            (Some(trail), Direction::Long) => price <= trail,
            (Some(trail), Direction::Short) => price >= trail,
        }
    }

    pub fn target_hit(&self, price: f64) -> bool {
        match (self.take_profit_price, self.direction) {
            (None, _) => false,
            (Some(target), Direction::Long) => price >= target,
            (Some(target), Direction::Short) => price <= target,
        }
    }

    /// Close `ratio` of the remaining size at `execution_price`.
    ///
    /// Returns the fraction of the original quantity closed and the gross PnL
    /// booked, or `None` if the one-shot partial was already taken.
    pub fn take_partial(&mut self, execution_price: f64, ratio: f64) -> Option<(f64, f64)> {
        if self.partial_taken {
            return None;
        }
        let fraction = self.remaining_size * ratio.clamp(0.0, 1.0);
        let pnl = (execution_price - self.entry_price) * self.direction.sign() * self.quantity * fraction;
        self.remaining_size -= fraction;
        self.realized_pnl += pnl;
        self.partial_taken = true;
        Some((fraction, pnl))
    }
}
