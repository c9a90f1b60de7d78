//! TradeRecord — a completed round trip with full cost attribution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Direction;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    StopLoss,
    TrailingStop,
    TakeProfit,
    StrategyExit,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::StopLoss => "STOP_LOSS",
            ExitReason::TrailingStop => "TRAILING_STOP",
            ExitReason::TakeProfit => "TAKE_PROFIT",
            ExitReason::StrategyExit => "STRATEGY_EXIT",
        }
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A closed trade: entry → optional partial → exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Identification ──
    pub symbol: String,
    pub strategy: String,
    pub direction: Direction,

    // ── Entry ──
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub entry_reason: String,

    // ── Exit ──
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    // ── Size ──
    pub quantity: f64,
    pub partial_taken: bool,

    // ── PnL ──
    pub gross_pnl: f64,
    pub fees: f64,
    pub slippage: f64,
    pub net_pnl: f64,

    // ── Excursion ──
    pub mfe: f64,
    pub mae: f64,
}

impl TradeRecord {
    /// Net return as a fraction of entry notional.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 || self.quantity == 0.0 {
            return 0.0;
        }
        self.net_pnl / (self.entry_price * self.quantity)
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }

    pub fn holding_seconds(&self) -> i64 {
        (self.exit_time - self.entry_time).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_trade() -> TradeRecord {
        TradeRecord {
            symbol: "ETHUSDT".into(),
            strategy: "momentum".into(),
            direction: Direction::Long,
            entry_time: Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap(),
            entry_price: 100.0,
            entry_reason: "velocity breakout".into(),
            exit_time: Utc.with_ymd_and_hms(2024, 1, 5, 10, 7, 30).unwrap(),
            exit_price: 110.0,
            exit_reason: ExitReason::TakeProfit,
            quantity: 10.0,
            partial_taken: false,
            gross_pnl: 100.0,
            fees: 2.1,
            slippage: 0.5,
            net_pnl: 97.9,
            mfe: 0.12,
            mae: 0.01,
        }
    }

    #[test]
    fn return_pct_uses_entry_notional() {
        let trade = sample_trade();
        assert!((trade.return_pct() - 0.0979).abs() < 1e-12);
        assert!(trade.is_winner());
        assert_eq!(trade.holding_seconds(), 450);
    }

    #[test]
    fn exit_reason_wire_names() {
        let json = serde_json::to_string(&ExitReason::TrailingStop).unwrap();
        assert_eq!(json, "\"TRAILING_STOP\"");
        assert_eq!(ExitReason::StopLoss.to_string(), "STOP_LOSS");
    }
}
