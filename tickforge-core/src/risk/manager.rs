//! Position manager — the open-trade half of the risk engine.
//!
//! Owns at most one [`Position`]. Entries go through [`EntryPlan`]: the plan
//! is fully priced, sized and geometry-checked before anything changes, so a
//! rejected plan leaves no trace. While holding, each tick runs
//! [`update`](PositionManager::update) (excursion, partial take, trailing
//! ratchet) and then [`evaluate_exit`](PositionManager::evaluate_exit), whose
//! order is hard stop, trailing stop, take-profit.

use chrono::{DateTime, Utc};

use super::{CostModel, PositionSizer};
use crate::config::EngineConfig;
use crate::domain::{Direction, ExitReason, PartialFill, Position, PositionError, Signal, TradeRecord};
use crate::indicators::Regime;

/// A priced, sized and validated entry that has not been committed.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPlan {
    pub position: Position,
    pub signal_price: f64,
    pub notional: f64,
    pub entry_fee: f64,
    pub entry_slippage: f64,
}

#[derive(Debug, Clone)]
pub struct PositionManager {
    config: EngineConfig,
    cost: CostModel,
    sizer: PositionSizer,
    position: Option<Position>,
}

impl PositionManager {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            cost: CostModel::new(config.slippage_pct, config.trading_fee_pct),
            sizer: PositionSizer::new(config.risk.clone()),
            config: config.clone(),
            position: None,
        }
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost
    }

    /// Price, size and validate an entry for `signal`.
    ///
    /// The stop comes from the signal, else `atr × atr_stop_multiplier` from
    /// the fill, else `fallback_stop_pct`. The target comes from the signal,
    /// else the optional ATR multiple.
    pub fn plan_entry(&self, signal: &Signal, equity: f64, atr: Option<f64>) -> Result<EntryPlan, PositionError> {
        if self.position.is_some() {
            return Err(PositionError::AlreadyOpen(signal.symbol.clone()));
        }
        let direction = signal.direction;
        let sign = direction.sign();
        let (entry, _) = self.cost.apply_slippage(signal.price, direction.entry_side(), 1.0);
        let atr = atr.filter(|a| a.is_finite() && *a > 0.0);

        let stop = match (signal.stop_loss, atr) {
            (Some(stop), _) => stop,
            (None, Some(atr)) => entry - sign * atr * self.config.atr_stop_multiplier,
            (None, None) => entry * (1.0 - sign * self.config.fallback_stop_pct),
        };
        let target = signal.take_profit.or_else(|| {
            let mult = self.config.take_profit_atr_multiplier?;
            Some(entry + sign * atr? * mult)
        });

        let quantity = self.sizer.size(equity, entry, stop);
        let position = Position::open(
            signal.symbol.clone(),
            direction,
            entry,
            quantity,
            signal.timestamp,
            stop,
            target,
            signal.reason.clone(),
        )?;
        let notional = entry * quantity;
        Ok(EntryPlan {
            position,
            signal_price: signal.price,
            notional,
            entry_fee: self.cost.fee(entry, quantity),
            entry_slippage: (entry - signal.price).abs() * quantity,
        })
    }

    /// Commit a plan. Fails only if a position is already open.
    pub fn open(&mut self, plan: EntryPlan, opened_at: DateTime<Utc>) -> Result<&Position, PositionError> {
        if let Some(existing) = &self.position {
            return Err(PositionError::AlreadyOpen(existing.symbol.clone()));
        }
        let mut position = plan.position;
        position.entry_time = opened_at;
        position.fees_paid = plan.entry_fee;
        position.slippage_cost = plan.entry_slippage;
        let trail = self.config.trailing_stop_pct;
        if trail > 0.0 {
            position.ratchet_trailing(plan.signal_price * (1.0 - position.direction.sign() * trail));
        }
        Ok(self.position.insert(position))
    }

    fn partial_threshold(&self, regime: Regime) -> f64 {
        match regime {
            Regime::Trending => self.config.partial_take_pct_trending,
            Regime::Ranging => self.config.partial_take_pct_ranging,
            Regime::Volatile | Regime::Unknown => self.config.partial_take_pct,
        }
    }

    /// Per-tick maintenance of the open position.
    ///
    /// Returns the partial fill if the one-shot partial triggered this tick.
    pub fn update(&mut self, price: f64, regime: Regime) -> Option<PartialFill> {
        let threshold = self.partial_threshold(regime);
        let config = &self.config;
        let cost = self.cost;
        let position = self.position.as_mut()?;
        let sign = position.direction.sign();
        position.mark(price);

        let mut fill = None;
        if config.partial_profit_enabled && !position.partial_taken && position.favorable_excursion() >= threshold {
            let (execution_price, _) = cost.apply_slippage(price, position.direction.exit_side(), 1.0);
            if let Some((fraction, gross_pnl)) = position.take_partial(execution_price, config.partial_close_ratio) {
                let closed = position.quantity * fraction;
                let fee = cost.fee(execution_price, closed);
                let slippage = (price - execution_price).abs() * closed;
                position.fees_paid += fee;
                position.slippage_cost += slippage;

                position.tighten_stop(position.entry_price * (1.0 + sign * config.post_partial_stop_buffer_pct));
                if position.trailing_stop_price.is_some() {
                    let stop = position.stop_loss_price;
                    position.ratchet_trailing(stop);
                }
                fill = Some(PartialFill {
                    trigger_price: price,
                    execution_price,
                    fraction_closed: fraction,
                    gross_pnl,
                    fee,
                    slippage,
                    stop_loss_price: position.stop_loss_price,
                });
            }
        }

        let mut trail = config.trailing_stop_pct;
        if position.partial_taken {
            trail *= config.post_partial_trail_reduction;
        }
        if trail > 0.0 {
            position.ratchet_trailing(price * (1.0 - sign * trail));
        }
        fill
    }

    /// Risk-engine exits in priority order.
    pub fn evaluate_exit(&self, price: f64) -> Option<ExitReason> {
        let position = self.position.as_ref()?;
        if position.stop_hit(price) {
            Some(ExitReason::StopLoss)
        } else if position.trailing_hit(price) {
            Some(ExitReason::TrailingStop)
        } else if position.target_hit(price) {
            Some(ExitReason::TakeProfit)
        } else {
            None
        }
    }

    /// Close the remainder at `price` and account the round trip.
    pub fn close(
        &mut self,
        price: f64,
        closed_at: DateTime<Utc>,
        reason: ExitReason,
        strategy: &str,
    ) -> Option<TradeRecord> {
        let position = self.position.take()?;
        let (exit_price, _) = self.cost.apply_slippage(price, position.direction.exit_side(), 1.0);
        let open_qty = position.open_quantity();
        let exit_fee = self.cost.fee(exit_price, open_qty);
        let gross_pnl = position.realized_pnl + position.unrealized_pnl(exit_price);
        let fees = position.fees_paid + exit_fee;
        let slippage = position.slippage_cost + (price - exit_price).abs() * open_qty;

        Some(TradeRecord {
            symbol: position.symbol.clone(),
            strategy: strategy.to_string(),
            direction: position.direction,
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            entry_reason: position.entry_reason.clone(),
            exit_time: closed_at,
            exit_price,
            exit_reason: reason,
            quantity: position.quantity,
            partial_taken: position.partial_taken,
            gross_pnl,
            fees,
            slippage,
            net_pnl: gross_pnl - fees,
            mfe: position.favorable_excursion(),
            mae: position.adverse_excursion(),
        })
    }

    /// Drop the position without accounting. Used only when lifecycle state
    /// and position state disagree.
    pub fn discard(&mut self) -> Option<Position> {
        self.position.take()
    }
}
