//! Capital allocation shared across instrument engines.
//!
//! Engines ask before opening and hand back after closing. The allocator owns
//! every allocation record, keyed by `(symbol, strategy)`; an engine only ever
//! holds the granted amount.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Admission control for new positions.
///
/// Calls from concurrently running engines must be serialized by the
/// implementation.
pub trait CapitalAllocator: Send + Sync {
    /// Request `amount` of notional. A grant below `amount` is a denial.
    fn request_allocation(&self, symbol: &str, strategy: &str, amount: f64) -> f64;

    /// Return a grant together with the realized PnL of the trade it funded.
    fn release_allocation(&self, symbol: &str, strategy: &str, original_amount: f64, pnl: f64);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorLimits {
    pub initial_capital: f64,
    /// Largest share of capital one symbol may hold.
    pub max_per_symbol_pct: f64,
    /// Largest share of capital one strategy may hold.
    pub max_per_strategy_pct: f64,
    /// New grants stop once capital falls this far below its peak.
    pub max_drawdown_pct: f64,
}

impl Default for AllocatorLimits {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            max_per_symbol_pct: 0.2,
            max_per_strategy_pct: 0.6,
            max_drawdown_pct: 0.1,
        }
    }
}

/// Point-in-time view of the allocation book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocatorSnapshot {
    pub capital: f64,
    pub peak_capital: f64,
    pub allocated: f64,
    pub per_symbol: BTreeMap<String, f64>,
    pub per_strategy: BTreeMap<String, f64>,
    pub granted: u64,
    pub denied: u64,
}

#[derive(Debug)]
struct Book {
    capital: f64,
    peak: f64,
    records: BTreeMap<(String, String), f64>,
    granted: u64,
    denied: u64,
}

impl Book {
    fn allocated(&self) -> f64 {
        self.records.values().sum()
    }

    fn symbol_exposure(&self, symbol: &str) -> f64 {
        self.records
            .iter()
            .filter(|((s, _), _)| s == symbol)
            .map(|(_, v)| v)
            .sum()
    }

    fn strategy_exposure(&self, strategy: &str) -> f64 {
        self.records
            .iter()
            .filter(|((_, s), _)| s == strategy)
            .map(|(_, v)| v)
            .sum()
    }
}

/// Mutex-serialized all-or-nothing allocator with exposure caps and a
/// drawdown guard.
#[derive(Debug)]
pub struct SharedAllocator {
    limits: AllocatorLimits,
    book: Mutex<Book>,
}

impl SharedAllocator {
    pub fn new(limits: AllocatorLimits) -> Self {
        let capital = limits.initial_capital;
        Self {
            limits,
            book: Mutex::new(Book {
                capital,
                peak: capital,
                records: BTreeMap::new(),
                granted: 0,
                denied: 0,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Book> {
        // a panicking engine must not take the book down with it
        self.book.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn limits(&self) -> &AllocatorLimits {
        &self.limits
    }

    pub fn snapshot(&self) -> AllocatorSnapshot {
        let book = self.lock();
        let mut per_symbol = BTreeMap::new();
        let mut per_strategy = BTreeMap::new();
        for ((symbol, strategy), amount) in &book.records {
            *per_symbol.entry(symbol.clone()).or_insert(0.0) += amount;
            *per_strategy.entry(strategy.clone()).or_insert(0.0) += amount;
        }
        AllocatorSnapshot {
            capital: book.capital,
            peak_capital: book.peak,
            allocated: book.allocated(),
            per_symbol,
            per_strategy,
            granted: book.granted,
            denied: book.denied,
        }
    }

    fn denial(&self, book: &Book, symbol: &str, strategy: &str, amount: f64) -> Option<&'static str> {
        if !(amount > 0.0) {
            return Some("non-positive request");
        }
        let drawdown = if book.peak > 0.0 { (book.peak - book.capital) / book.peak } else { 1.0 };
        if drawdown >= self.limits.max_drawdown_pct {
            return Some("drawdown guard");
        }
        if book.allocated() + amount > book.capital {
            return Some("insufficient free capital");
        }
        if book.symbol_exposure(symbol) + amount > book.capital * self.limits.max_per_symbol_pct {
            return Some("symbol cap");
        }
        if book.strategy_exposure(strategy) + amount > book.capital * self.limits.max_per_strategy_pct {
            return Some("strategy cap");
        }
        None
    }
}

impl CapitalAllocator for SharedAllocator {
    fn request_allocation(&self, symbol: &str, strategy: &str, amount: f64) -> f64 {
        let mut book = self.lock();
        if let Some(reason) = self.denial(&book, symbol, strategy, amount) {
            book.denied += 1;
            debug!(symbol, strategy, amount, reason, "allocation denied");
            return 0.0;
        }
        *book
            .records
            .entry((symbol.to_string(), strategy.to_string()))
            .or_insert(0.0) += amount;
        book.granted += 1;
        amount
    }

    fn release_allocation(&self, symbol: &str, strategy: &str, original_amount: f64, pnl: f64) {
        let mut book = self.lock();
        let key = (symbol.to_string(), strategy.to_string());
        match book.records.get_mut(&key) {
            Some(held) => {
                *held -= original_amount;
                if *held <= 1e-9 {
                    book.records.remove(&key);
                }
            }
            None => warn!(symbol, strategy, original_amount, "release without a matching allocation"),
        }
        book.capital += pnl;
        if book.capital > book.peak {
            book.peak = book.capital;
        }
    }
}
