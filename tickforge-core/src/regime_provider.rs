//! External regime classification.
//!
//! The engine only asks which regime applies to pick a partial-profit
//! threshold. Without a provider it classifies from its own history.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::indicators::Regime;

pub trait RegimeProvider: Send + Sync {
    fn get_regime(&self, symbol: &str, at: DateTime<Utc>) -> Regime;
}

/// Timestamped regime schedule per symbol.
///
/// Each entry applies from its timestamp until the next one. Queries before
/// the first entry, or for unknown symbols, answer `Unknown`.
#[derive(Debug, Clone, Default)]
pub struct ScheduledRegimes {
    schedules: HashMap<String, BTreeMap<DateTime<Utc>, Regime>>,
}

impl ScheduledRegimes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, from: DateTime<Utc>, regime: Regime) {
        self.schedules.entry(symbol.into()).or_default().insert(from, regime);
    }

    pub fn with(mut self, symbol: impl Into<String>, from: DateTime<Utc>, regime: Regime) -> Self {
        self.insert(symbol, from, regime);
        self
    }
}

impl RegimeProvider for ScheduledRegimes {
    fn get_regime(&self, symbol: &str, at: DateTime<Utc>) -> Regime {
        self.schedules
            .get(symbol)
            .and_then(|schedule| schedule.range(..=at).next_back())
            .map(|(_, regime)| *regime)
            .unwrap_or(Regime::Unknown)
    }
}
