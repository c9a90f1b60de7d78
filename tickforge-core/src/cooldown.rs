//! Loss-streak cooldown escalation.
//!
//! Consecutive stop-loss closes are counted. When the count reaches the
//! threshold, the next cooldown is multiplied once and the count starts over,
//! so escalation never compounds across cycles. Any other exit reason, or a
//! stop-loss that still closed in profit, resets the count.

use chrono::Duration;

use crate::config::{seconds, EngineConfig};
use crate::domain::ExitReason;

#[derive(Debug, Clone)]
pub struct CooldownController {
    base: Duration,
    enabled: bool,
    streak_threshold: u32,
    multiplier: f64,
    consecutive_stop_losses: u32,
}

impl CooldownController {
    pub fn new(base: Duration, enabled: bool, streak_threshold: u32, multiplier: f64) -> Self {
        Self {
            base,
            enabled,
            streak_threshold: streak_threshold.max(1),
            multiplier,
            consecutive_stop_losses: 0,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.cooldown_duration(),
            config.loser_suppression_enabled,
            config.loser_streak_threshold,
            config.extended_cooldown_multiplier,
        )
    }

    pub fn consecutive_stop_losses(&self) -> u32 {
        self.consecutive_stop_losses
    }

    pub fn base_duration(&self) -> Duration {
        self.base
    }

    /// Record a close and return the cooldown it earns.
    pub fn record_close(&mut self, reason: ExitReason, net_pnl: f64) -> Duration {
        if reason == ExitReason::StopLoss && net_pnl <= 0.0 {
            self.consecutive_stop_losses += 1;
        } else {
            self.consecutive_stop_losses = 0;
        }

        if self.enabled && self.consecutive_stop_losses >= self.streak_threshold {
            self.consecutive_stop_losses = 0;
            let base_secs = self.base.num_milliseconds() as f64 / 1_000.0;
            return seconds(base_secs * self.multiplier);
        }
        self.base
    }
}
