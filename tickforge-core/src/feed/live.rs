//! Live source: one tick per received price snapshot.
//!
//! The network side is external; it pushes [`PriceSnapshot`]s into an mpsc
//! channel and this feed stamps them with wall-clock time on receipt.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::MarketDataSource;
use crate::domain::Tick;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSnapshot {
    pub price: f64,
    pub volume: f64,
}

pub struct LiveFeed {
    symbol: String,
    receiver: Option<Receiver<PriceSnapshot>>,
    poll_interval: StdDuration,
}

impl LiveFeed {
    pub fn new(symbol: impl Into<String>, receiver: Receiver<PriceSnapshot>, poll_interval: StdDuration) -> Self {
        Self {
            symbol: symbol.into(),
            receiver: Some(receiver),
            poll_interval,
        }
    }
}

impl MarketDataSource for LiveFeed {
    fn get_next_tick(&mut self) -> Option<Tick> {
        let receiver = self.receiver.as_ref()?;
        match receiver.recv_timeout(self.poll_interval) {
            Ok(snapshot) if snapshot.price.is_finite() && snapshot.price > 0.0 => {
                Some(Tick::new(self.symbol.clone(), Utc::now(), snapshot.price, snapshot.volume))
            }
            Ok(snapshot) => {
                debug!(symbol = %self.symbol, price = snapshot.price, "dropping invalid snapshot");
                None
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                info!(symbol = %self.symbol, "live feed disconnected");
                self.receiver = None;
                None
            }
        }
    }

    fn get_current_time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn has_more_data(&self) -> bool {
        self.receiver.is_some()
    }

    fn cleanup(&mut self) {
        self.receiver = None;
    }
}
