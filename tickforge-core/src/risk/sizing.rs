//! Position sizing.
//!
//! Every method is bounded twice: the loss between entry and stop may not
//! exceed `equity × risk_per_trade_pct`, and notional may not exceed
//! `equity × max_position_pct × max_leverage`. The result is floored to
//! `size_precision_decimals` so rounding never pushes past either bound.

use crate::config::{RiskConfig, SizingMethod};

#[derive(Debug, Clone)]
pub struct PositionSizer {
    config: RiskConfig,
}

impl PositionSizer {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Kelly fraction `p − (1 − p) / b`, halved for half-Kelly, clamped to `[0, cap]`.
    pub fn kelly_fraction(&self) -> f64 {
        let p = self.config.kelly_win_rate;
        let b = self.config.kelly_win_loss_ratio;
        if b <= 0.0 {
            return 0.0;
        }
        let full = p - (1.0 - p) / b;
        let f = match self.config.sizing_method {
            SizingMethod::HalfKelly => full / 2.0,
            _ => full,
        };
        f.clamp(0.0, self.config.kelly_cap)
    }

    /// Quantity for an entry at `entry` protected by `stop`.
    pub fn size(&self, equity: f64, entry: f64, stop: f64) -> f64 {
        if !(equity > 0.0) || !(entry > 0.0) {
            return 0.0;
        }
        let risk_per_unit = (entry - stop).abs();
        if !(risk_per_unit > 0.0) {
            return 0.0;
        }
        let c = &self.config;
        let by_risk = equity * c.risk_per_trade_pct / risk_per_unit;
        let raw = match c.sizing_method {
            SizingMethod::FixedFraction => by_risk,
            SizingMethod::FixedNotional => c.position_size_usd / entry,
            SizingMethod::Kelly | SizingMethod::HalfKelly => equity * self.kelly_fraction() / entry,
        };
        let by_notional = equity * c.max_position_pct * c.max_leverage / entry;
        floor_to(raw.min(by_risk).min(by_notional), c.size_precision_decimals)
    }
}

fn floor_to(value: f64, decimals: u32) -> f64 {
    if !(value > 0.0) {
        return 0.0;
    }
    let factor = 10f64.powi(decimals as i32);
    (value * factor).floor() / factor
}
