//! Engine — the per-instrument orchestrator.
//!
//! One engine owns everything about one symbol: rolling history, strategy,
//! lifecycle, open position and cooldown streak. Each call to
//! [`Engine::on_tick`] fully processes one tick:
//!
//! 1. Advance time-driven lifecycle transitions (cooldown expiry).
//! 2. WAIT: ask the strategy; on a signal, plan the entry, ask the allocator,
//!    then move WAIT → ENTRY → HOLD and open the position.
//! 3. HOLD: update excursion, partial and trailing state, then evaluate exits
//!    (hard stop, trailing, take-profit, strategy exit).
//! 4. Emit a decision event for every transition and trade.
//!
//! Nothing inside a tick returns an error. Faults are reported as events and
//! contained to this engine.

mod statistics;

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::allocator::CapitalAllocator;
use crate::config::{ConfigError, EngineConfig};
use crate::cooldown::CooldownController;
use crate::domain::{ExitReason, Position, Tick, TradeRecord};
use crate::events::{DecisionEvent, EventKind, EventSink, NullSink};
use crate::fingerprint::TradeLog;
use crate::indicators::{atr, classify_regime, PriceHistory, Regime};
use crate::lifecycle::{StateContext, StateMachine, TradingState, Transition};
use crate::regime_provider::RegimeProvider;
use crate::risk::PositionManager;
use crate::strategy::{create_strategy, Strategy, StrategyConfig};

pub use statistics::EngineStatistics;

pub struct Engine {
    symbol: String,
    config: EngineConfig,
    strategy: Box<dyn Strategy>,
    lifecycle: StateMachine,
    positions: PositionManager,
    cooldown: CooldownController,
    history: PriceHistory,
    allocator: Option<Arc<dyn CapitalAllocator>>,
    regimes: Option<Arc<dyn RegimeProvider>>,
    sink: Box<dyn EventSink>,
    /// Amount granted by the allocator for the open position.
    allocation: Option<f64>,
    equity: f64,
    tick_count: u64,
    trades: Vec<TradeRecord>,
}

impl Engine {
    /// Build an engine. Configuration errors surface here and never mid-run.
    pub fn new(symbol: impl Into<String>, config: EngineConfig, strategy: Box<dyn Strategy>) -> Result<Self, ConfigError> {
        config.validate()?;
        let required = strategy.warmup_ticks();
        if required > config.history_capacity {
            return Err(ConfigError::HistoryTooSmall {
                capacity: config.history_capacity,
                required,
            });
        }
        Ok(Self {
            symbol: symbol.into(),
            lifecycle: StateMachine::new(config.cooldown_duration()),
            positions: PositionManager::new(&config),
            cooldown: CooldownController::from_config(&config),
            history: PriceHistory::new(config.history_capacity),
            allocator: None,
            regimes: None,
            sink: Box::new(NullSink),
            allocation: None,
            equity: config.initial_equity,
            tick_count: 0,
            trades: Vec::new(),
            strategy,
            config,
        })
    }

    /// Build an engine running the configured strategy.
    pub fn from_config(symbol: impl Into<String>, config: EngineConfig, strategy: &StrategyConfig) -> Result<Self, ConfigError> {
        let strategy = create_strategy(strategy, &config)?;
        Self::new(symbol, config, strategy)
    }

    pub fn with_allocator(mut self, allocator: Arc<dyn CapitalAllocator>) -> Self {
        self.allocator = Some(allocator);
        self
    }

    pub fn with_regime_provider(mut self, provider: Arc<dyn RegimeProvider>) -> Self {
        self.regimes = Some(provider);
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn state(&self) -> TradingState {
        self.lifecycle.state()
    }

    pub fn state_context(&self) -> &StateContext {
        self.lifecycle.context()
    }

    pub fn position(&self) -> Option<&Position> {
        self.positions.position()
    }

    pub fn equity(&self) -> f64 {
        self.equity
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn trade_log(&self) -> TradeLog {
        TradeLog::new(self.trades.clone())
    }

    pub fn consecutive_stop_losses(&self) -> u32 {
        self.cooldown.consecutive_stop_losses()
    }

    pub fn get_statistics(&self) -> EngineStatistics {
        EngineStatistics::collect(
            &self.symbol,
            self.lifecycle.state(),
            self.tick_count,
            &self.trades,
            self.equity,
            self.cooldown.consecutive_stop_losses(),
        )
    }

    pub fn flush_events(&mut self) {
        self.sink.flush();
    }

    // ── Tick processing ──────────────────────────────────────────────

    /// Process one tick and return the state the engine ends in.
    pub fn on_tick(&mut self, tick: &Tick) -> TradingState {
        if !tick.price.is_finite() || tick.price <= 0.0 {
            let event = DecisionEvent::new(tick.timestamp, &self.symbol, self.state(), EventKind::Error, "invalid tick price", tick.price);
            self.sink.record(&event);
            return self.state();
        }
        if tick.symbol != self.symbol {
            warn!(engine = %self.symbol, tick = %tick.symbol, "ignoring tick for another symbol");
            return self.state();
        }

        self.tick_count += 1;
        self.history.push_tick(tick);

        if let Some(transition) = self.lifecycle.update(tick.timestamp) {
            self.emit_transition(transition, tick.price);
        }

        if self.state() == TradingState::Hold && self.positions.position().is_none() {
            self.recover_corrupt_state(tick);
        }

        match self.state() {
            TradingState::Wait => self.try_enter(tick),
            TradingState::Hold => self.manage_position(tick),
            _ => {}
        }
        self.state()
    }

    fn try_enter(&mut self, tick: &Tick) {
        let Some(signal) = self.strategy.on_tick(tick, &self.history) else {
            return;
        };
        let atr = self.current_atr();
        let plan = match self.positions.plan_entry(&signal, self.equity, atr) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(symbol = %self.symbol, error = %err, "entry plan rejected");
                self.emit_rejection(tick, err.to_string());
                return;
            }
        };

        if let Some(allocator) = &self.allocator {
            let granted = allocator.request_allocation(&self.symbol, self.strategy.name(), plan.notional);
            if granted < plan.notional {
                if granted > 0.0 {
                    allocator.release_allocation(&self.symbol, self.strategy.name(), granted, 0.0);
                }
                debug!(symbol = %self.symbol, requested = plan.notional, granted, "allocation denied");
                self.emit_rejection(tick, format!("allocation denied: requested {:.2}, granted {:.2}", plan.notional, granted));
                return;
            }
            self.allocation = Some(granted);
        }

        let Some(transition) = self.lifecycle.request_entry(tick.timestamp, &signal.reason) else {
            self.release_allocation(0.0);
            return;
        };
        self.emit_transition(transition, tick.price);

        let (entry_fee, entry_slippage) = (plan.entry_fee, plan.entry_slippage);
        let opened = self.positions.open(plan, tick.timestamp).map(|p| (p.entry_price, p.direction));
        let (entry_price, direction) = match opened {
            Ok(opened) => opened,
            Err(err) => {
                error!(symbol = %self.symbol, error = %err, "position open failed after admission");
                self.release_allocation(0.0);
                let transition = self.lifecycle.recover_to_wait(tick.timestamp, "entry aborted");
                self.emit_transition(transition, tick.price);
                return;
            }
        };
        if let Some(transition) = self.lifecycle.confirm_fill(tick.timestamp) {
            self.emit_transition(transition, tick.price);
        }

        let mut event = DecisionEvent::new(tick.timestamp, &self.symbol, self.state(), EventKind::PositionEntry, signal.reason, tick.price);
        event.execution_price = Some(entry_price);
        event.fees = Some(entry_fee);
        event.slippage = Some(entry_slippage);
        event.direction = Some(direction);
        self.sink.record(&event);
    }

    fn manage_position(&mut self, tick: &Tick) {
        let regime = self.current_regime(tick);
        if let Some(fill) = self.positions.update(tick.price, regime) {
            let mut event = DecisionEvent::new(
                tick.timestamp,
                &self.symbol,
                self.state(),
                EventKind::PartialTake,
                format!("mfe partial {:.0}% in {regime:?}", fill.fraction_closed * 100.0),
                tick.price,
            );
            event.execution_price = Some(fill.execution_price);
            event.fees = Some(fill.fee);
            event.slippage = Some(fill.slippage);
            event.gross_pnl = Some(fill.gross_pnl);
            event.direction = self.positions.position().map(|p| p.direction);
            self.sink.record(&event);
        }

        let reason = self.positions.evaluate_exit(tick.price).or_else(|| {
            let position = self.positions.position()?;
            self.strategy
                .should_exit(position, tick, &self.history)
                .then_some(ExitReason::StrategyExit)
        });
        if let Some(reason) = reason {
            self.exit(tick, reason);
        }
    }

    fn exit(&mut self, tick: &Tick, reason: ExitReason) {
        if let Some(transition) = self.lifecycle.force_exit(tick.timestamp, reason.as_str()) {
            self.emit_transition(transition, tick.price);
        }
        let Some(trade) = self.positions.close(tick.price, tick.timestamp, reason, self.strategy.name()) else {
            self.recover_corrupt_state(tick);
            return;
        };

        self.equity += trade.net_pnl;
        self.release_allocation(trade.net_pnl);

        let mut event = DecisionEvent::new(tick.timestamp, &self.symbol, self.state(), EventKind::PositionExit, reason.as_str(), tick.price);
        event.execution_price = Some(trade.exit_price);
        event.fees = Some(trade.fees);
        event.slippage = Some(trade.slippage);
        event.gross_pnl = Some(trade.gross_pnl);
        event.net_pnl = Some(trade.net_pnl);
        event.direction = Some(trade.direction);
        self.sink.record(&event);

        let duration = self.cooldown.record_close(reason, trade.net_pnl);
        self.trades.push(trade);
        // crosses and counters seen while holding are stale by the next WAIT
        self.strategy.reset();
        if let Some(transition) = self.lifecycle.begin_cooldown(tick.timestamp, duration) {
            self.emit_transition(transition, tick.price);
        }
    }

    /// HOLD without a position: force WAIT, report, keep running.
    fn recover_corrupt_state(&mut self, tick: &Tick) {
        error!(symbol = %self.symbol, state = %self.state(), "position state corrupt, recovering to WAIT");
        let event = DecisionEvent::new(tick.timestamp, &self.symbol, self.state(), EventKind::Error, "position missing while holding", tick.price);
        self.sink.record(&event);
        self.positions.discard();
        self.release_allocation(0.0);
        let transition = self.lifecycle.recover_to_wait(tick.timestamp, "corrupt position state");
        self.emit_transition(transition, tick.price);
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn release_allocation(&mut self, pnl: f64) {
        if let (Some(amount), Some(allocator)) = (self.allocation.take(), &self.allocator) {
            allocator.release_allocation(&self.symbol, self.strategy.name(), amount, pnl);
        }
    }

    fn current_atr(&self) -> Option<f64> {
        atr(self.history.highs(), self.history.lows(), self.history.prices(), self.config.atr_period)
    }

    fn current_regime(&self, tick: &Tick) -> Regime {
        match &self.regimes {
            Some(provider) => provider.get_regime(&self.symbol, tick.timestamp),
            None => classify_regime(self.history.prices(), self.current_atr(), self.config.regime_lookback_ticks),
        }
    }

    fn emit_transition(&mut self, transition: Transition, price: f64) {
        let reason = format!("{} -> {}: {}", transition.from, transition.to, transition.reason);
        let event = DecisionEvent::new(transition.at, &self.symbol, transition.to, EventKind::StateTransition, reason, price);
        self.sink.record(&event);
    }

    fn emit_rejection(&mut self, tick: &Tick, reason: String) {
        let event = DecisionEvent::new(tick.timestamp, &self.symbol, self.state(), EventKind::EntryRejected, reason, tick.price);
        self.sink.record(&event);
    }
}
