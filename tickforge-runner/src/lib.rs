//! TickForge Runner — run configuration, candle data and session drivers.
//!
//! This crate builds on `tickforge-core` to provide:
//! - TOML run configuration with a content-addressed run id
//! - Candle CSV loading with validation, and CSV export
//! - Seeded synthetic candle generation
//! - Replay sessions (historical candles, as fast as possible)
//! - Live sessions over any `MarketDataSource` with cooperative shutdown
//! - Concurrent multi-instrument runs sharing one capital allocator

pub mod config;
pub mod data_loader;
pub mod portfolio;
pub mod session;
pub mod synthetic;

pub use config::{ConfigError, InstrumentConfig, ReplaySettings, RunConfig};
pub use data_loader::{load_candles, read_candles, write_candles, LoadError};
pub use portfolio::{run_portfolio, run_portfolio_with, InstrumentOutcome, PortfolioReport};
pub use session::{run_live, run_replay, LiveSummary, ReplayReport, RunError};
pub use synthetic::generate_synthetic_candles;
