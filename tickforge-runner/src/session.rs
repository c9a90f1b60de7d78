//! Session drivers — wire feeds, engines and sinks together.
//!
//! Two entry points:
//! - `run_replay()`: pre-expands candles into ticks and drives one engine as
//!   fast as possible. Used by the CLI and by multi-instrument runs.
//! - `run_live()`: drives an engine from any `MarketDataSource` until the
//!   source is exhausted or the stop flag is raised.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use tickforge_core::allocator::CapitalAllocator;
use tickforge_core::domain::{Candle, TradeRecord};
use tickforge_core::events::{DecisionEvent, FanoutSink, RecordingSink, TracingSink};
use tickforge_core::feed::{FeedError, HistoricalFeed, MarketDataSource};
use tickforge_core::fingerprint::TradeLogHash;
use tickforge_core::{Engine, EngineStatistics};

use crate::config::{ConfigError, RunConfig, RunId};
use crate::data_loader::LoadError;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("engine config error: {0}")]
    Engine(#[from] tickforge_core::ConfigError),
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("instrument '{symbol}' panicked: {message}")]
    Panicked { symbol: String, message: String },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Complete result of one replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    pub run_id: RunId,
    pub symbol: String,
    pub strategy: String,
    pub candle_count: usize,
    pub statistics: EngineStatistics,
    pub trades: Vec<TradeRecord>,
    pub fingerprint: TradeLogHash,
    pub final_equity: f64,
    /// Every decision event in emission order. Exported separately as JSON lines.
    #[serde(skip)]
    pub events: Vec<DecisionEvent>,
}

impl ReplayReport {
    pub fn write_json(&self, path: &Path) -> Result<(), RunError> {
        let io_err = |source| RunError::Io {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| io_err(e.into()))?;
        std::fs::write(path, json).map_err(io_err)
    }

    /// One JSON object per event, newline-terminated.
    pub fn write_events(&self, path: &Path) -> Result<(), RunError> {
        let io_err = |source| RunError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut out = String::new();
        for event in &self.events {
            out.push_str(&serde_json::to_string(event).map_err(|e| io_err(e.into()))?);
            out.push('\n');
        }
        std::fs::write(path, out).map_err(io_err)
    }
}

/// Replay `candles` for `symbol` through a fresh engine.
pub fn run_replay(
    config: &RunConfig,
    symbol: &str,
    candles: &[Candle],
    allocator: Option<Arc<dyn CapitalAllocator>>,
) -> Result<ReplayReport, RunError> {
    let strategy = config.strategy_for(symbol);
    let recorder = RecordingSink::new();
    let sink = FanoutSink::new()
        .with(Box::new(recorder.clone()))
        .with(Box::new(TracingSink));

    let mut engine = Engine::from_config(symbol, config.engine.clone(), strategy)?.with_sink(Box::new(sink));
    if let Some(allocator) = allocator {
        engine = engine.with_allocator(allocator);
    }

    let mut feed = HistoricalFeed::new(
        symbol,
        candles,
        config.replay.tick_interval(),
        config.replay.candle_duration(),
    )?;
    info!(symbol, strategy = strategy.name(), candles = candles.len(), ticks = feed.len(), "replay started");

    while let Some(tick) = feed.get_next_tick() {
        engine.on_tick(&tick);
    }
    feed.cleanup();
    engine.flush_events();

    let statistics = engine.get_statistics();
    let fingerprint = engine.trade_log().fingerprint();
    info!(
        symbol,
        trades = statistics.trade_count,
        win_rate = statistics.win_rate,
        total_pnl = statistics.total_pnl,
        fingerprint = %fingerprint,
        "replay finished"
    );

    Ok(ReplayReport {
        run_id: config.run_id(),
        symbol: symbol.to_string(),
        strategy: engine.strategy_name().to_string(),
        candle_count: candles.len(),
        statistics,
        trades: engine.trades().to_vec(),
        fingerprint,
        final_equity: engine.equity(),
        events: recorder.events(),
    })
}

/// Outcome of a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSummary {
    pub ticks: u64,
    pub gaps: u64,
    /// True when the stop flag ended the session before the source ran dry.
    pub stopped: bool,
    pub position_open: bool,
}

/// Drive `engine` from `source` until exhausted or `stop` is raised.
///
/// Gaps (no tick within the source's poll window) are counted and skipped.
/// An open position is left open on shutdown.
pub fn run_live(engine: &mut Engine, source: &mut dyn MarketDataSource, stop: &AtomicBool) -> LiveSummary {
    let mut summary = LiveSummary {
        ticks: 0,
        gaps: 0,
        stopped: false,
        position_open: false,
    };
    info!(symbol = engine.symbol(), strategy = engine.strategy_name(), "live session started");

    while source.has_more_data() {
        if stop.load(Ordering::Relaxed) {
            summary.stopped = true;
            break;
        }
        match source.get_next_tick() {
            Some(tick) => {
                engine.on_tick(&tick);
                summary.ticks += 1;
            }
            None => summary.gaps += 1,
        }
    }

    source.cleanup();
    engine.flush_events();
    summary.position_open = engine.position().is_some();
    if summary.position_open {
        warn!(symbol = engine.symbol(), "live session ended with an open position");
    }
    info!(
        symbol = engine.symbol(),
        ticks = summary.ticks,
        gaps = summary.gaps,
        stopped = summary.stopped,
        at = %source.get_current_time(),
        "live session finished"
    );
    summary
}
