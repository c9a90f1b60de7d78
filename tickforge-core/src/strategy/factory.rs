//! Strategy factory — turns a `StrategyConfig` into a boxed `Strategy`.

use serde::{Deserialize, Serialize};

use super::{
    BreakoutParams, BreakoutStrategy, MeanReversionParams, MeanReversionStrategy, MomentumParams,
    MomentumStrategy, ScalpingParams, ScalpingStrategy, Strategy, TrendFollowParams,
    TrendFollowStrategy,
};
use crate::config::{ConfigError, EngineConfig};

/// Which strategy an engine runs, with its parameters.
///
/// Momentum draws its parameters from `EngineConfig` (the arm threshold and
/// persistence are engine-level options); the other variants carry their own.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    #[default]
    Momentum,
    MeanReversion(MeanReversionParams),
    TrendFollow(TrendFollowParams),
    Breakout(BreakoutParams),
    Scalping(ScalpingParams),
}

impl StrategyConfig {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyConfig::Momentum => "momentum",
            StrategyConfig::MeanReversion(_) => "mean_reversion",
            StrategyConfig::TrendFollow(_) => "trend_follow",
            StrategyConfig::Breakout(_) => "breakout",
            StrategyConfig::Scalping(_) => "scalping",
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |field: &'static str, value: f64| {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::OutOfRange {
                    field,
                    value,
                    expected: "> 0",
                })
            }
        };
        match self {
            StrategyConfig::Momentum => Ok(()),
            StrategyConfig::MeanReversion(p) => {
                if p.period < 2 {
                    return Err(ConfigError::OutOfRange {
                        field: "period",
                        value: p.period as f64,
                        expected: ">= 2",
                    });
                }
                positive("rsi_period", p.rsi_period as f64)?;
                positive("std_multiplier", p.std_multiplier)
            }
            StrategyConfig::TrendFollow(p) => {
                positive("fast_period", p.fast_period as f64)?;
                if p.fast_period >= p.slow_period {
                    return Err(ConfigError::OutOfRange {
                        field: "fast_period",
                        value: p.fast_period as f64,
                        expected: "< slow_period",
                    });
                }
                Ok(())
            }
            StrategyConfig::Breakout(p) => positive("lookback", p.lookback as f64),
            StrategyConfig::Scalping(p) => {
                positive("lookback", p.lookback as f64)?;
                positive("stop_pct", p.stop_pct)?;
                positive("target_pct", p.target_pct)
            }
        }
    }
}

/// Build the configured strategy.
pub fn create_strategy(config: &StrategyConfig, engine: &EngineConfig) -> Result<Box<dyn Strategy>, ConfigError> {
    config.validate()?;
    let strategy: Box<dyn Strategy> = match config {
        StrategyConfig::Momentum => Box::new(MomentumStrategy::new(MomentumParams::from_config(engine))),
        StrategyConfig::MeanReversion(p) => Box::new(MeanReversionStrategy::new(p.clone())),
        StrategyConfig::TrendFollow(p) => Box::new(TrendFollowStrategy::new(p.clone())),
        StrategyConfig::Breakout(p) => Box::new(BreakoutStrategy::new(p.clone())),
        StrategyConfig::Scalping(p) => Box::new(ScalpingStrategy::new(p.clone())),
    };
    Ok(strategy)
}
