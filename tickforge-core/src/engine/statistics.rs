//! Engine statistics — a snapshot of one engine's activity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::TradeRecord;
use crate::lifecycle::TradingState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatistics {
    pub symbol: String,
    pub state: TradingState,
    pub tick_count: u64,
    /// Closed round trips.
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Winners as a percentage of closed trades (0.0 with no trades).
    pub win_rate: f64,
    /// Sum of net P&L across closed trades.
    pub total_pnl: f64,
    pub total_fees: f64,
    pub equity: f64,
    pub avg_holding_seconds: f64,
    pub consecutive_stop_losses: u32,
    pub exits_by_reason: BTreeMap<String, usize>,
}

impl EngineStatistics {
    pub(crate) fn collect(
        symbol: &str,
        state: TradingState,
        tick_count: u64,
        trades: &[TradeRecord],
        equity: f64,
        consecutive_stop_losses: u32,
    ) -> Self {
        let trade_count = trades.len();
        let winning_trades = trades.iter().filter(|t| t.is_winner()).count();
        let win_rate = if trade_count > 0 {
            winning_trades as f64 / trade_count as f64 * 100.0
        } else {
            0.0
        };
        let avg_holding_seconds = if trade_count > 0 {
            trades.iter().map(|t| t.holding_seconds() as f64).sum::<f64>() / trade_count as f64
        } else {
            0.0
        };

        let mut exits_by_reason = BTreeMap::new();
        for trade in trades {
            *exits_by_reason.entry(trade.exit_reason.as_str().to_string()).or_insert(0) += 1;
        }

        Self {
            symbol: symbol.to_string(),
            state,
            tick_count,
            trade_count,
            winning_trades,
            losing_trades: trade_count - winning_trades,
            win_rate,
            total_pnl: trades.iter().map(|t| t.net_pnl).sum(),
            total_fees: trades.iter().map(|t| t.fees).sum(),
            equity,
            avg_holding_seconds,
            consecutive_stop_losses,
            exits_by_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, ExitReason};
    use chrono::{Duration, TimeZone, Utc};

    fn trade(net_pnl: f64, reason: ExitReason, held_secs: i64) -> TradeRecord {
        let entry_time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        TradeRecord {
            symbol: "BTCUSD".into(),
            strategy: "momentum".into(),
            direction: Direction::Long,
            entry_time,
            entry_price: 100.0,
            entry_reason: "test".into(),
            exit_time: entry_time + Duration::seconds(held_secs),
            exit_price: 100.0 + net_pnl,
            exit_reason: reason,
            quantity: 1.0,
            partial_taken: false,
            gross_pnl: net_pnl + 0.1,
            fees: 0.1,
            slippage: 0.0,
            net_pnl,
            mfe: 0.0,
            mae: 0.0,
        }
    }

    #[test]
    fn empty_run_has_zero_rates() {
        let stats = EngineStatistics::collect("BTCUSD", TradingState::Wait, 10, &[], 10_000.0, 0);
        assert_eq!(stats.trade_count, 0);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.avg_holding_seconds, 0.0);
        assert!(stats.exits_by_reason.is_empty());
    }

    #[test]
    fn aggregates_closed_trades() {
        let trades = vec![
            trade(5.0, ExitReason::TakeProfit, 60),
            trade(-2.0, ExitReason::StopLoss, 120),
            trade(-1.0, ExitReason::StopLoss, 30),
            trade(3.0, ExitReason::TrailingStop, 90),
        ];
        let stats = EngineStatistics::collect("BTCUSD", TradingState::Cooldown, 500, &trades, 10_005.0, 0);

        assert_eq!(stats.trade_count, 4);
        assert_eq!(stats.winning_trades, 2);
        assert_eq!(stats.losing_trades, 2);
        assert!((stats.win_rate - 50.0).abs() < 1e-12);
        assert!((stats.total_pnl - 5.0).abs() < 1e-12);
        assert!((stats.total_fees - 0.4).abs() < 1e-12);
        assert!((stats.avg_holding_seconds - 75.0).abs() < 1e-12);
        assert_eq!(stats.exits_by_reason["STOP_LOSS"], 2);
        assert_eq!(stats.exits_by_reason["TAKE_PROFIT"], 1);
    }
}
