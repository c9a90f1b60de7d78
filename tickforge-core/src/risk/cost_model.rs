//! Cost model — slippage and fee calculation.
//!
//! Slippage is directional: buyers pay more, sellers receive less. Fees are a
//! flat fraction of fill notional, charged on every leg (entry, partial, exit).

use crate::domain::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl Direction {
    /// Side of the opening fill.
    pub fn entry_side(self) -> OrderSide {
        match self {
            Direction::Long => OrderSide::Buy,
            Direction::Short => OrderSide::Sell,
        }
    }

    /// Side of any closing fill.
    pub fn exit_side(self) -> OrderSide {
        match self {
            Direction::Long => OrderSide::Sell,
            Direction::Short => OrderSide::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    /// Adverse price move per fill, as a fraction of price.
    pub slippage_pct: f64,
    /// Fee per fill, as a fraction of notional.
    pub fee_pct: f64,
}

impl CostModel {
    pub fn new(slippage_pct: f64, fee_pct: f64) -> Self {
        Self { slippage_pct, fee_pct }
    }

    pub fn frictionless() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Apply slippage to a raw fill price.
    ///
    /// Returns `(slipped_price, slippage_dollar_amount)`.
    pub fn apply_slippage(&self, raw_price: f64, side: OrderSide, quantity: f64) -> (f64, f64) {
        if self.slippage_pct == 0.0 {
            return (raw_price, 0.0);
        }
        match side {
            OrderSide::Buy => {
                let slipped = raw_price * (1.0 + self.slippage_pct);
                (slipped, (slipped - raw_price) * quantity)
            }
            OrderSide::Sell => {
                let slipped = raw_price * (1.0 - self.slippage_pct);
                (slipped, (raw_price - slipped) * quantity)
            }
        }
    }

    /// `fee = fill_price × quantity × fee_pct`
    pub fn fee(&self, fill_price: f64, quantity: f64) -> f64 {
        fill_price * quantity * self.fee_pct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frictionless_returns_raw_price() {
        let cost = CostModel::frictionless();
        let (price, slip) = cost.apply_slippage(100.0, OrderSide::Buy, 50.0);
        assert_eq!(price, 100.0);
        assert_eq!(slip, 0.0);
        assert_eq!(cost.fee(100.0, 50.0), 0.0);
    }

    #[test]
    fn buy_slippage_increases_price() {
        let cost = CostModel::new(0.001, 0.0);
        let (price, slip) = cost.apply_slippage(100.0, OrderSide::Buy, 100.0);
        assert!((price - 100.10).abs() < 1e-10);
        assert!((slip - 10.0).abs() < 1e-10);
    }

    #[test]
    fn sell_slippage_decreases_price() {
        let cost = CostModel::new(0.001, 0.0);
        let (price, slip) = cost.apply_slippage(100.0, OrderSide::Sell, 100.0);
        assert!((price - 99.90).abs() < 1e-10);
        assert!((slip - 10.0).abs() < 1e-10);
    }

    #[test]
    fn fee_on_notional() {
        let cost = CostModel::new(0.0, 0.001);
        assert!((cost.fee(100.0, 10.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn sides_follow_direction() {
        assert_eq!(Direction::Long.entry_side(), OrderSide::Buy);
        assert_eq!(Direction::Long.exit_side(), OrderSide::Sell);
        assert_eq!(Direction::Short.entry_side(), OrderSide::Sell);
        assert_eq!(Direction::Short.exit_side(), OrderSide::Buy);
    }
}
