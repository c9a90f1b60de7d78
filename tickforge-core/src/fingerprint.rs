//! Trade-log fingerprinting — determinism checks for replays.
//!
//! Two replays of identical candles under identical configuration must yield
//! identical trade logs. Each record is reduced to canonical JSON (sorted keys,
//! fixed field set) and fed through BLAKE3, so comparing logs is comparing
//! two hex strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::TradeRecord;

/// Hex BLAKE3 digest of a trade log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeLogHash(pub String);

impl fmt::Display for TradeLogHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered list of closed trades for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeLog {
    pub trades: Vec<TradeRecord>,
}

impl TradeLog {
    pub fn new(trades: Vec<TradeRecord>) -> Self {
        Self { trades }
    }

    pub fn fingerprint(&self) -> TradeLogHash {
        let mut hasher = blake3::Hasher::new();
        for trade in &self.trades {
            let canonical = json!({
                "symbol": trade.symbol,
                "strategy": trade.strategy,
                "direction": trade.direction.as_str(),
                "entry_time": trade.entry_time.timestamp_millis(),
                "entry_price": trade.entry_price,
                "exit_time": trade.exit_time.timestamp_millis(),
                "exit_price": trade.exit_price,
                "exit_reason": trade.exit_reason.as_str(),
                "quantity": trade.quantity,
                "partial_taken": trade.partial_taken,
                "gross_pnl": trade.gross_pnl,
                "fees": trade.fees,
                "net_pnl": trade.net_pnl,
            });
            hasher.update(canonical.to_string().as_bytes());
            hasher.update(b"\n");
        }
        TradeLogHash(hasher.finalize().to_hex().to_string())
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, ExitReason};
    use chrono::{TimeZone, Utc};

    fn trade(net: f64) -> TradeRecord {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        TradeRecord {
            symbol: "BTC".into(),
            strategy: "momentum".into(),
            direction: Direction::Long,
            entry_time: t,
            entry_price: 100.0,
            entry_reason: "x".into(),
            exit_time: t,
            exit_price: 101.0,
            exit_reason: ExitReason::TakeProfit,
            quantity: 1.0,
            partial_taken: false,
            gross_pnl: 1.0,
            fees: 0.2,
            slippage: 0.0,
            net_pnl: net,
            mfe: 0.01,
            mae: 0.0,
        }
    }

    #[test]
    fn identical_logs_share_fingerprint() {
        let a = TradeLog::new(vec![trade(0.8), trade(-0.3)]);
        let b = TradeLog::new(vec![trade(0.8), trade(-0.3)]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().0.len(), 64);
    }

    #[test]
    fn any_change_alters_fingerprint() {
        let a = TradeLog::new(vec![trade(0.8)]);
        let b = TradeLog::new(vec![trade(0.8000001)]);
        let c = TradeLog::new(vec![trade(0.8), trade(0.8)]);
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn empty_log_is_stable() {
        assert_eq!(TradeLog::default().fingerprint(), TradeLog::new(vec![]).fingerprint());
    }
}
