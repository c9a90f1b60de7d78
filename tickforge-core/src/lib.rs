//! TickForge Core — tick-driven trading engine.
//!
//! This crate contains everything that runs inside one instrument's engine:
//! - Domain types (candles, ticks, signals, positions, trade records)
//! - Tick sources: candle interpolation replay and live snapshots
//! - Rolling price history and pure indicator functions
//! - Pluggable strategies behind one trait (momentum, mean reversion, trend, breakout, scalping)
//! - Five-state lifecycle machine with loss-streak cooldown escalation
//! - Risk engine: sizing, slippage and fees, stops, partial profit, trailing ratchet
//! - Cross-engine seams: capital allocator and regime provider
//! - Structured decision events and trade-log fingerprints

pub mod allocator;
pub mod config;
pub mod cooldown;
pub mod domain;
pub mod engine;
pub mod events;
pub mod feed;
pub mod fingerprint;
pub mod indicators;
pub mod lifecycle;
pub mod regime_provider;
pub mod risk;
pub mod strategy;

pub use config::{ConfigError, EngineConfig, RiskConfig, SizingMethod};
pub use engine::{Engine, EngineStatistics};
pub use lifecycle::TradingState;
