//! Per-instrument lifecycle state machine.
//!
//! ```text
//! WAIT ──admitted signal──▶ ENTRY ──fill──▶ HOLD ──exit──▶ EXIT ──▶ COOLDOWN ──elapsed──▶ WAIT
//! ```
//!
//! Requests from the wrong state are ignored and return `None`; nothing is
//! mutated. Cooldown expiry is measured against tick timestamps so replays
//! never depend on wall-clock time. `recover_to_wait` is the one edge outside
//! the table, reserved for repairing a HOLD state that lost its position.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradingState {
    Wait,
    Entry,
    Hold,
    Exit,
    Cooldown,
}

impl TradingState {
    pub fn as_str(self) -> &'static str {
        match self {
            TradingState::Wait => "WAIT",
            TradingState::Entry => "ENTRY",
            TradingState::Hold => "HOLD",
            TradingState::Exit => "EXIT",
            TradingState::Cooldown => "COOLDOWN",
        }
    }
}

impl std::fmt::Display for TradingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One applied state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: TradingState,
    pub to: TradingState,
    pub reason: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateContext {
    pub current_state: TradingState,
    pub cooldown_start_time: Option<DateTime<Utc>>,
    pub cooldown_duration: Option<Duration>,
    pub last_transition: Option<Transition>,
}

#[derive(Debug, Clone)]
pub struct StateMachine {
    context: StateContext,
    default_cooldown: Duration,
}

impl StateMachine {
    pub fn new(default_cooldown: Duration) -> Self {
        Self {
            context: StateContext {
                current_state: TradingState::Wait,
                cooldown_start_time: None,
                cooldown_duration: None,
                last_transition: None,
            },
            default_cooldown,
        }
    }

    pub fn state(&self) -> TradingState {
        self.context.current_state
    }

    pub fn context(&self) -> &StateContext {
        &self.context
    }

    pub fn can_enter(&self) -> bool {
        self.context.current_state == TradingState::Wait
    }

    fn apply(&mut self, to: TradingState, reason: &str, at: DateTime<Utc>) -> Transition {
        let transition = Transition {
            from: self.context.current_state,
            to,
            reason: reason.to_string(),
            at,
        };
        self.context.current_state = to;
        self.context.last_transition = Some(transition.clone());
        transition
    }

    /// Time-driven transitions. Returns the transition applied, if any.
    pub fn update(&mut self, now: DateTime<Utc>) -> Option<Transition> {
        match self.context.current_state {
            TradingState::Cooldown => {
                let start = self.context.cooldown_start_time?;
                let duration = self.context.cooldown_duration.unwrap_or(self.default_cooldown);
                if now - start >= duration {
                    self.context.cooldown_start_time = None;
                    self.context.cooldown_duration = None;
                    Some(self.apply(TradingState::Wait, "cooldown elapsed", now))
                } else {
                    None
                }
            }
            // EXIT is transient; a caller that never completed it still lands in COOLDOWN
            TradingState::Exit => self.begin_cooldown(now, self.default_cooldown),
            _ => None,
        }
    }

    /// WAIT → ENTRY.
    pub fn request_entry(&mut self, now: DateTime<Utc>, reason: &str) -> Option<Transition> {
        if self.context.current_state != TradingState::Wait {
            return None;
        }
        Some(self.apply(TradingState::Entry, reason, now))
    }

    /// ENTRY → HOLD.
    pub fn confirm_fill(&mut self, now: DateTime<Utc>) -> Option<Transition> {
        if self.context.current_state != TradingState::Entry {
            return None;
        }
        Some(self.apply(TradingState::Hold, "fill confirmed", now))
    }

    /// HOLD or ENTRY → EXIT.
    pub fn force_exit(&mut self, now: DateTime<Utc>, reason: &str) -> Option<Transition> {
        match self.context.current_state {
            TradingState::Hold | TradingState::Entry => Some(self.apply(TradingState::Exit, reason, now)),
            _ => None,
        }
    }

    /// EXIT → COOLDOWN with the given duration.
    pub fn begin_cooldown(&mut self, now: DateTime<Utc>, duration: Duration) -> Option<Transition> {
        if self.context.current_state != TradingState::Exit {
            return None;
        }
        self.context.cooldown_start_time = Some(now);
        self.context.cooldown_duration = Some(duration);
        let reason = format!("cooldown {}s", duration.num_milliseconds() as f64 / 1_000.0);
        Some(self.apply(TradingState::Cooldown, &reason, now))
    }

    /// Any state → WAIT. Only for repairing corrupt position state.
    pub fn recover_to_wait(&mut self, now: DateTime<Utc>, reason: &str) -> Transition {
        self.context.cooldown_start_time = None;
        self.context.cooldown_duration = None;
        self.apply(TradingState::Wait, reason, now)
    }

    /// Time left in the current cooldown, if cooling down.
    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.context.current_state != TradingState::Cooldown {
            return None;
        }
        let start = self.context.cooldown_start_time?;
        let duration = self.context.cooldown_duration.unwrap_or(self.default_cooldown);
        Some((duration - (now - start)).max(Duration::zero()))
    }
}
