//! Decision events and the sinks that receive them.
//!
//! Every entry, partial, exit and state transition produces one
//! [`DecisionEvent`]. Sinks never fail the engine: a sink that cannot write
//! reports through `tracing` and carries on.

use std::io::Write;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::domain::Direction;
use crate::lifecycle::TradingState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    PositionEntry,
    PartialTake,
    PositionExit,
    StateTransition,
    EntryRejected,
    Error,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::PositionEntry => "POSITION_ENTRY",
            EventKind::PartialTake => "PARTIAL_TAKE",
            EventKind::PositionExit => "POSITION_EXIT",
            EventKind::StateTransition => "STATE_TRANSITION",
            EventKind::EntryRejected => "ENTRY_REJECTED",
            EventKind::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionEvent {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub state: TradingState,
    pub event: EventKind,
    pub reason: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fees: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slippage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_pnl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_pnl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

impl DecisionEvent {
    pub fn new(
        timestamp: DateTime<Utc>,
        symbol: impl Into<String>,
        state: TradingState,
        event: EventKind,
        reason: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            timestamp,
            symbol: symbol.into(),
            state,
            event,
            reason: reason.into(),
            price,
            execution_price: None,
            fees: None,
            slippage: None,
            gross_pnl: None,
            net_pnl: None,
            direction: None,
        }
    }
}

/// Receiver of decision events.
pub trait EventSink: Send {
    fn record(&mut self, event: &DecisionEvent);

    fn flush(&mut self) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: &DecisionEvent) {}
}

/// Emits each event as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&mut self, e: &DecisionEvent) {
        match e.event {
            EventKind::Error => error!(
                symbol = %e.symbol, state = %e.state, reason = %e.reason, price = e.price,
                "engine error"
            ),
            EventKind::EntryRejected => warn!(
                symbol = %e.symbol, state = %e.state, reason = %e.reason, price = e.price,
                "entry rejected"
            ),
            EventKind::StateTransition => tracing::debug!(
                symbol = %e.symbol, state = %e.state, reason = %e.reason,
                "state transition"
            ),
            kind => info!(
                symbol = %e.symbol,
                event = kind.as_str(),
                state = %e.state,
                reason = %e.reason,
                price = e.price,
                execution_price = e.execution_price,
                fees = e.fees,
                gross_pnl = e.gross_pnl,
                net_pnl = e.net_pnl,
                direction = e.direction.map(Direction::as_str),
                "decision"
            ),
        }
    }
}

/// Keeps events in a shared buffer; clone the handle before boxing the sink.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<DecisionEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DecisionEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events().iter().filter(|e| e.event == kind).count()
    }
}

impl EventSink for RecordingSink {
    fn record(&mut self, event: &DecisionEvent) {
        let mut events = self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        events.push(event.clone());
    }
}

/// Forwards every event to each inner sink in order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Box<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutSink {
    fn record(&mut self, event: &DecisionEvent) {
        for sink in &mut self.sinks {
            sink.record(event);
        }
    }

    fn flush(&mut self) {
        for sink in &mut self.sinks {
            sink.flush();
        }
    }
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
    failures: u64,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, failures: 0 }
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn record(&mut self, event: &DecisionEvent) {
        let result = serde_json::to_writer(&mut self.writer, event)
            .map_err(std::io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        if let Err(err) = result {
            self.failures += 1;
            if self.failures == 1 {
                warn!(error = %err, "event sink write failed");
            }
        }
    }

    fn flush(&mut self) {
        if let Err(err) = self.writer.flush() {
            warn!(error = %err, "event sink flush failed");
        }
    }
}
