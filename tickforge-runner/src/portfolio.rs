//! Multi-instrument runs.
//!
//! Each instrument gets its own engine on a rayon worker. Engines share only
//! the capital allocator. A failing instrument (bad data, panic) is recorded
//! in its own outcome and never stops the others. With a shared allocator the
//! grant order depends on scheduling, so per-instrument results are only
//! reproducible without one.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info};

use tickforge_core::allocator::{AllocatorSnapshot, CapitalAllocator, SharedAllocator};
use tickforge_core::domain::Candle;

use crate::config::{InstrumentConfig, RunConfig};
use crate::data_loader::{load_candles, LoadError};
use crate::session::{run_replay, ReplayReport, RunError};

#[derive(Debug)]
pub struct InstrumentOutcome {
    pub symbol: String,
    pub result: Result<ReplayReport, RunError>,
}

#[derive(Debug)]
pub struct PortfolioReport {
    pub outcomes: Vec<InstrumentOutcome>,
    /// Final allocator book, when the run shared one.
    pub allocator: Option<AllocatorSnapshot>,
}

/// Flat per-instrument line for printing or JSON export.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeSummary {
    pub symbol: String,
    pub ok: bool,
    pub trades: usize,
    pub total_pnl: f64,
    pub final_equity: f64,
    pub fingerprint: Option<String>,
    pub error: Option<String>,
}

impl PortfolioReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn total_pnl(&self) -> f64 {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|r| r.statistics.total_pnl)
            .sum()
    }

    pub fn summaries(&self) -> Vec<OutcomeSummary> {
        self.outcomes
            .iter()
            .map(|o| match &o.result {
                Ok(report) => OutcomeSummary {
                    symbol: o.symbol.clone(),
                    ok: true,
                    trades: report.statistics.trade_count,
                    total_pnl: report.statistics.total_pnl,
                    final_equity: report.final_equity,
                    fingerprint: Some(report.fingerprint.0.clone()),
                    error: None,
                },
                Err(err) => OutcomeSummary {
                    symbol: o.symbol.clone(),
                    ok: false,
                    trades: 0,
                    total_pnl: 0.0,
                    final_equity: 0.0,
                    fingerprint: None,
                    error: Some(err.to_string()),
                },
            })
            .collect()
    }
}

/// Run every `[[instruments]]` entry, loading candles from its CSV path.
pub fn run_portfolio(config: &RunConfig) -> Result<PortfolioReport, RunError> {
    run_portfolio_with(config, |instrument| load_candles(&instrument.candles))
}

/// Run every instrument with candles supplied by `load`.
pub fn run_portfolio_with<F>(config: &RunConfig, load: F) -> Result<PortfolioReport, RunError>
where
    F: Fn(&InstrumentConfig) -> Result<Vec<Candle>, LoadError> + Sync,
{
    config.validate()?;
    let shared = config.allocator.clone().map(|limits| Arc::new(SharedAllocator::new(limits)));
    info!(
        instruments = config.instruments.len(),
        shared_allocator = shared.is_some(),
        run_id = %config.run_id(),
        "portfolio run started"
    );

    let outcomes: Vec<InstrumentOutcome> = config
        .instruments
        .par_iter()
        .map(|instrument| {
            let allocator = shared.clone().map(|a| a as Arc<dyn CapitalAllocator>);
            let result = catch_unwind(AssertUnwindSafe(|| {
                let candles = load(instrument)?;
                run_replay(config, &instrument.symbol, &candles, allocator)
            }))
            .unwrap_or_else(|payload| {
                Err(RunError::Panicked {
                    symbol: instrument.symbol.clone(),
                    message: panic_message(payload.as_ref()),
                })
            });
            if let Err(err) = &result {
                error!(symbol = %instrument.symbol, error = %err, "instrument failed");
            }
            InstrumentOutcome {
                symbol: instrument.symbol.clone(),
                result,
            }
        })
        .collect();

    let report = PortfolioReport {
        outcomes,
        allocator: shared.map(|a| a.snapshot()),
    };
    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        total_pnl = report.total_pnl(),
        "portfolio run finished"
    );
    Ok(report)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::generate_synthetic_candles;
    use std::path::PathBuf;
    use tickforge_core::allocator::AllocatorLimits;
    use tickforge_core::strategy::{ScalpingParams, StrategyConfig};

    fn instrument(symbol: &str) -> InstrumentConfig {
        InstrumentConfig {
            symbol: symbol.to_string(),
            candles: PathBuf::from(format!("{symbol}.csv")),
            strategy: None,
        }
    }

    fn config(symbols: &[&str]) -> RunConfig {
        RunConfig {
            strategy: StrategyConfig::Scalping(ScalpingParams::default()),
            instruments: symbols.iter().map(|s| instrument(s)).collect(),
            ..RunConfig::default()
        }
    }

    fn synthetic(instrument: &InstrumentConfig) -> Result<Vec<Candle>, LoadError> {
        Ok(generate_synthetic_candles(&instrument.symbol, 11, 200, 100.0))
    }

    #[test]
    fn outcomes_keep_instrument_order() {
        let report = run_portfolio_with(&config(&["A", "B", "C", "D"]), synthetic).unwrap();
        let symbols: Vec<_> = report.outcomes.iter().map(|o| o.symbol.as_str()).collect();
        assert_eq!(symbols, ["A", "B", "C", "D"]);
        assert_eq!(report.succeeded(), 4);
        assert!(report.allocator.is_none());
    }

    #[test]
    fn independent_runs_match_single_replays() {
        let cfg = config(&["A", "B"]);
        let report = run_portfolio_with(&cfg, synthetic).unwrap();
        for outcome in &report.outcomes {
            let candles = synthetic(&instrument(&outcome.symbol)).unwrap();
            let single = run_replay(&cfg, &outcome.symbol, &candles, None).unwrap();
            assert_eq!(outcome.result.as_ref().unwrap().fingerprint, single.fingerprint);
        }
    }

    #[test]
    fn panic_and_load_failure_are_contained() {
        let report = run_portfolio_with(&config(&["GOOD", "PANIC", "MISSING"]), |i| match i.symbol.as_str() {
            "PANIC" => panic!("feed exploded"),
            "MISSING" => Err(LoadError::Empty(i.candles.display().to_string())),
            _ => synthetic(i),
        })
        .unwrap();

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 2);
        assert!(matches!(
            &report.outcomes[1].result,
            Err(RunError::Panicked { message, .. }) if message == "feed exploded"
        ));
        assert!(matches!(&report.outcomes[2].result, Err(RunError::Data(LoadError::Empty(_)))));

        let summaries = report.summaries();
        assert!(summaries[0].ok && summaries[0].fingerprint.is_some());
        assert!(!summaries[1].ok && summaries[1].error.is_some());
    }

    #[test]
    fn shared_allocator_is_fully_released() {
        let mut cfg = config(&["A", "B", "C"]);
        cfg.allocator = Some(AllocatorLimits::default());
        let report = run_portfolio_with(&cfg, synthetic).unwrap();
        let book = report.allocator.as_ref().unwrap();

        let open_positions = report
            .outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .filter(|r| r.statistics.state == tickforge_core::TradingState::Hold)
            .count();
        if open_positions == 0 {
            assert!(book.allocated.abs() < 1e-6);
        }
        assert!(book.granted > 0);
        let realized: f64 = report.total_pnl();
        assert!((book.capital - (100_000.0 + realized)).abs() < 1e-6);
    }

    #[test]
    fn invalid_config_fails_whole_run() {
        let mut cfg = config(&["A"]);
        cfg.engine.partial_close_ratio = 2.0;
        assert!(matches!(run_portfolio_with(&cfg, synthetic), Err(RunError::Config(_))));
    }
}
