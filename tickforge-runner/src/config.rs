//! Serializable run configuration.
//!
//! A run is one TOML document:
//!
//! ```toml
//! [engine]
//! arm_velocity_threshold = 0.004
//!
//! [strategy]
//! type = "mean_reversion"
//! period = 20
//!
//! [replay]
//! tick_interval_seconds = 2.0
//! candle_duration_seconds = 60.0
//!
//! [allocator]
//! initial_capital = 100000.0
//!
//! [[instruments]]
//! symbol = "BTCUSDT"
//! candles = "data/btc.csv"
//! ```
//!
//! Every table is optional; missing fields take their defaults.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tickforge_core::allocator::AllocatorLimits;
use tickforge_core::config::seconds;
use tickforge_core::strategy::StrategyConfig;
use tickforge_core::EngineConfig;

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid engine config: {0}")]
    Engine(#[from] tickforge_core::ConfigError),

    #[error("replay.{field} = {value} must be positive and no larger than candle_duration_seconds")]
    Replay { field: &'static str, value: f64 },

    #[error("instrument '{0}' is listed more than once")]
    DuplicateInstrument(String),
}

/// Tick cadence for candle replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaySettings {
    pub tick_interval_seconds: f64,
    pub candle_duration_seconds: f64,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            tick_interval_seconds: 2.0,
            candle_duration_seconds: 60.0,
        }
    }
}

impl ReplaySettings {
    pub fn tick_interval(&self) -> Duration {
        seconds(self.tick_interval_seconds)
    }

    pub fn candle_duration(&self) -> Duration {
        seconds(self.candle_duration_seconds)
    }
}

/// One instrument of a multi-instrument run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub symbol: String,
    /// Candle CSV path, relative to the working directory.
    pub candles: PathBuf,
    /// Overrides the run-level strategy for this instrument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub engine: EngineConfig,
    pub strategy: StrategyConfig,
    pub replay: ReplaySettings,
    /// Present only when instruments share a capital pool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocator: Option<AllocatorLimits>,
    pub instruments: Vec<InstrumentConfig>,
}

impl RunConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.strategy.validate()?;
        for instrument in &self.instruments {
            if let Some(strategy) = &instrument.strategy {
                strategy.validate()?;
            }
        }

        let r = &self.replay;
        if !(r.tick_interval_seconds >= 0.001) || r.tick_interval_seconds > r.candle_duration_seconds {
            return Err(ConfigError::Replay {
                field: "tick_interval_seconds",
                value: r.tick_interval_seconds,
            });
        }
        if !r.candle_duration_seconds.is_finite() {
            return Err(ConfigError::Replay {
                field: "candle_duration_seconds",
                value: r.candle_duration_seconds,
            });
        }

        let mut seen = std::collections::BTreeSet::new();
        for instrument in &self.instruments {
            if !seen.insert(instrument.symbol.as_str()) {
                return Err(ConfigError::DuplicateInstrument(instrument.symbol.clone()));
            }
        }
        Ok(())
    }

    /// Strategy for `symbol`: the instrument override, else the run default.
    pub fn strategy_for(&self, symbol: &str) -> &StrategyConfig {
        self.instruments
            .iter()
            .find(|i| i.symbol == symbol)
            .and_then(|i| i.strategy.as_ref())
            .unwrap_or(&self.strategy)
    }

    /// Deterministic hash of the canonical JSON form.
    ///
    /// Two runs with identical configuration share a run id.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }
}
