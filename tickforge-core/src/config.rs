//! Engine configuration.
//!
//! `EngineConfig` is immutable once an engine is built. Every field has a
//! default so partial TOML documents deserialize, and `validate()` is the
//! single place where out-of-range values are rejected.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A configuration value outside its legal range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} = {value} is out of range (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("history_capacity {capacity} cannot hold the {required} samples needed before signalling")]
    HistoryTooSmall { capacity: usize, required: usize },
}

/// Position sizing method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMethod {
    #[default]
    FixedFraction,
    FixedNotional,
    Kelly,
    HalfKelly,
}

/// Sizing and exposure limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub sizing_method: SizingMethod,
    /// Equity fraction risked between entry and stop.
    pub risk_per_trade_pct: f64,
    /// Notional per trade for `fixed_notional`.
    pub position_size_usd: f64,
    /// Largest notional as a fraction of equity, before leverage.
    pub max_position_pct: f64,
    pub max_leverage: f64,
    pub kelly_win_rate: f64,
    /// Average win divided by average loss.
    pub kelly_win_loss_ratio: f64,
    pub kelly_cap: f64,
    /// Sizes are floored to this many decimals.
    pub size_precision_decimals: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            sizing_method: SizingMethod::FixedFraction,
            risk_per_trade_pct: 0.01,
            position_size_usd: 1_000.0,
            max_position_pct: 0.25,
            max_leverage: 1.0,
            kelly_win_rate: 0.55,
            kelly_win_loss_ratio: 1.5,
            kelly_cap: 0.2,
            size_precision_decimals: 8,
        }
    }
}

/// Every tunable of one per-instrument engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // ── Signal arming ──
    pub arm_velocity_threshold: f64,
    pub arm_persistence_ticks: usize,
    pub velocity_lookback_ticks: usize,
    pub acceleration_window_ticks: usize,
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub signal_decay_enabled: bool,

    // ── Stops and targets ──
    pub atr_stop_multiplier: f64,
    pub atr_period: usize,
    pub fallback_stop_pct: f64,
    pub take_profit_atr_multiplier: Option<f64>,
    pub trailing_stop_pct: f64,

    // ── Partial profit ──
    pub partial_profit_enabled: bool,
    pub partial_take_pct: f64,
    pub partial_take_pct_trending: f64,
    pub partial_take_pct_ranging: f64,
    pub partial_close_ratio: f64,
    pub post_partial_stop_buffer_pct: f64,
    pub post_partial_trail_reduction: f64,

    // ── Cooldown ──
    pub cooldown_duration_seconds: f64,
    pub loser_suppression_enabled: bool,
    pub loser_streak_threshold: u32,
    pub extended_cooldown_multiplier: f64,

    // ── Costs ──
    pub trading_fee_pct: f64,
    pub slippage_pct: f64,

    // ── Accounting and history ──
    pub initial_equity: f64,
    pub regime_lookback_ticks: usize,
    pub history_capacity: usize,

    pub risk: RiskConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            arm_velocity_threshold: 0.005,
            arm_persistence_ticks: 5,
            velocity_lookback_ticks: 15,
            acceleration_window_ticks: 3,
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            signal_decay_enabled: true,

            atr_stop_multiplier: 2.0,
            atr_period: 30,
            fallback_stop_pct: 0.02,
            take_profit_atr_multiplier: None,
            trailing_stop_pct: 0.02,

            partial_profit_enabled: true,
            partial_take_pct: 0.006,
            partial_take_pct_trending: 0.0045,
            partial_take_pct_ranging: 0.0075,
            partial_close_ratio: 0.5,
            post_partial_stop_buffer_pct: 0.0,
            post_partial_trail_reduction: 0.6,

            cooldown_duration_seconds: 60.0,
            loser_suppression_enabled: true,
            loser_streak_threshold: 3,
            extended_cooldown_multiplier: 3.0,

            trading_fee_pct: 0.001,
            slippage_pct: 0.0005,

            initial_equity: 10_000.0,
            regime_lookback_ticks: 20,
            history_capacity: 500,

            risk: RiskConfig::default(),
        }
    }
}

fn check(field: &'static str, value: f64, ok: bool, expected: &'static str) -> Result<(), ConfigError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected,
        })
    }
}

impl EngineConfig {
    pub fn cooldown_duration(&self) -> Duration {
        seconds(self.cooldown_duration_seconds)
    }

    /// Samples the built-in indicators need before they produce values.
    pub fn required_history(&self) -> usize {
        let momentum = self.velocity_lookback_ticks + 2 * self.acceleration_window_ticks;
        momentum
            .max(self.atr_period + 1)
            .max(self.rsi_period + 1)
            .max(self.regime_lookback_ticks)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check("arm_velocity_threshold", self.arm_velocity_threshold, self.arm_velocity_threshold >= 0.0, ">= 0")?;
        check("arm_persistence_ticks", self.arm_persistence_ticks as f64, self.arm_persistence_ticks >= 1, ">= 1")?;
        check("velocity_lookback_ticks", self.velocity_lookback_ticks as f64, self.velocity_lookback_ticks >= 1, ">= 1")?;
        check("acceleration_window_ticks", self.acceleration_window_ticks as f64, self.acceleration_window_ticks >= 1, ">= 1")?;
        check("rsi_period", self.rsi_period as f64, self.rsi_period >= 1, ">= 1")?;
        check("rsi_oversold", self.rsi_oversold, self.rsi_oversold < self.rsi_overbought, "< rsi_overbought")?;

        check("atr_stop_multiplier", self.atr_stop_multiplier, self.atr_stop_multiplier > 0.0, "> 0")?;
        check("atr_period", self.atr_period as f64, self.atr_period >= 1, ">= 1")?;
        check("fallback_stop_pct", self.fallback_stop_pct, self.fallback_stop_pct > 0.0 && self.fallback_stop_pct < 1.0, "in (0, 1)")?;
        if let Some(mult) = self.take_profit_atr_multiplier {
            check("take_profit_atr_multiplier", mult, mult > 0.0, "> 0")?;
        }
        check("trailing_stop_pct", self.trailing_stop_pct, (0.0..1.0).contains(&self.trailing_stop_pct), "in [0, 1)")?;

        for (field, value) in [
            ("partial_take_pct", self.partial_take_pct),
            ("partial_take_pct_trending", self.partial_take_pct_trending),
            ("partial_take_pct_ranging", self.partial_take_pct_ranging),
        ] {
            check(field, value, value > 0.0, "> 0")?;
        }
        check("partial_close_ratio", self.partial_close_ratio, self.partial_close_ratio > 0.0 && self.partial_close_ratio <= 1.0, "in (0, 1]")?;
        check("post_partial_stop_buffer_pct", self.post_partial_stop_buffer_pct, (0.0..1.0).contains(&self.post_partial_stop_buffer_pct), "in [0, 1)")?;
        check("post_partial_trail_reduction", self.post_partial_trail_reduction, self.post_partial_trail_reduction > 0.0 && self.post_partial_trail_reduction <= 1.0, "in (0, 1]")?;

        check("cooldown_duration_seconds", self.cooldown_duration_seconds, self.cooldown_duration_seconds >= 0.0, ">= 0")?;
        check("loser_streak_threshold", self.loser_streak_threshold as f64, self.loser_streak_threshold >= 1, ">= 1")?;
        check("extended_cooldown_multiplier", self.extended_cooldown_multiplier, self.extended_cooldown_multiplier >= 1.0, ">= 1")?;

        check("trading_fee_pct", self.trading_fee_pct, (0.0..1.0).contains(&self.trading_fee_pct), "in [0, 1)")?;
        check("slippage_pct", self.slippage_pct, (0.0..1.0).contains(&self.slippage_pct), "in [0, 1)")?;

        check("initial_equity", self.initial_equity, self.initial_equity > 0.0, "> 0")?;
        check("regime_lookback_ticks", self.regime_lookback_ticks as f64, self.regime_lookback_ticks >= 2, ">= 2")?;
        let required = self.required_history();
        if self.history_capacity < required {
            return Err(ConfigError::HistoryTooSmall {
                capacity: self.history_capacity,
                required,
            });
        }

        self.risk.validate()
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("risk_per_trade_pct", self.risk_per_trade_pct, self.risk_per_trade_pct > 0.0 && self.risk_per_trade_pct <= 1.0, "in (0, 1]")?;
        check("position_size_usd", self.position_size_usd, self.position_size_usd > 0.0, "> 0")?;
        check("max_position_pct", self.max_position_pct, self.max_position_pct > 0.0, "> 0")?;
        check("max_leverage", self.max_leverage, self.max_leverage > 0.0, "> 0")?;
        check("kelly_win_rate", self.kelly_win_rate, (0.0..=1.0).contains(&self.kelly_win_rate), "in [0, 1]")?;
        check("kelly_win_loss_ratio", self.kelly_win_loss_ratio, self.kelly_win_loss_ratio > 0.0, "> 0")?;
        check("kelly_cap", self.kelly_cap, (0.0..=1.0).contains(&self.kelly_cap), "in [0, 1]")?;
        check("size_precision_decimals", self.size_precision_decimals as f64, self.size_precision_decimals <= 12, "<= 12")
    }
}

/// Fractional seconds to a millisecond-resolution duration.
pub fn seconds(secs: f64) -> Duration {
    Duration::milliseconds((secs * 1_000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_document_fills_defaults() {
        let config: EngineConfig = from_json(r#"{"arm_persistence_ticks": 2, "risk": {"sizing_method": "half_kelly"}}"#);
        assert_eq!(config.arm_persistence_ticks, 2);
        assert_eq!(config.risk.sizing_method, SizingMethod::HalfKelly);
        assert_eq!(config.risk.kelly_cap, 0.2);
        assert_eq!(config.trailing_stop_pct, 0.02);
    }

    fn from_json(json: &str) -> EngineConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn rejects_zero_persistence() {
        let config = EngineConfig {
            arm_persistence_ticks: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "arm_persistence_ticks", .. })
        ));
    }

    #[test]
    fn rejects_trail_of_one() {
        let config = EngineConfig {
            trailing_stop_pct: 1.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_nan() {
        let config = EngineConfig {
            slippage_pct: f64::NAN,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_small_history() {
        let config = EngineConfig {
            history_capacity: 10,
            ..EngineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::HistoryTooSmall {
                capacity: 10,
                required: 31
            })
        );
    }

    #[test]
    fn rejects_bad_risk() {
        let mut config = EngineConfig::default();
        config.risk.kelly_win_rate = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn fractional_seconds_round_to_millis() {
        assert_eq!(seconds(2.0), Duration::seconds(2));
        assert_eq!(seconds(0.0015), Duration::milliseconds(2));
        assert_eq!(EngineConfig::default().cooldown_duration(), Duration::seconds(60));
    }
}
