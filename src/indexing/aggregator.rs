//! Per-run result aggregation and progress reporting.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::errors::{lock, FailureCollector, UnitFailure};
use super::pipeline::SearchReport;
use crate::symbol::Symbol;

/// Receives `(completed, total)` after every finished extraction task.
///
/// Calls are serialized, and `completed` increases by exactly one per call.
pub trait ProgressSink: Send + Sync {
    fn report(&self, completed: usize, total: usize);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn report(&self, completed: usize, total: usize) {
        self(completed, total)
    }
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _completed: usize, _total: usize) {}
}

/// Shared state of one search run.
///
/// A fresh aggregator is created for every run, so concurrent runs never
/// see each other's symbols.
pub struct ResultAggregator {
    symbols: Mutex<Vec<Symbol>>,
    completed: Mutex<usize>,
    total: AtomicUsize,
    failures: FailureCollector,
    progress: Arc<dyn ProgressSink>,
}

impl ResultAggregator {
    pub fn new(progress: Arc<dyn ProgressSink>) -> Self {
        Self {
            symbols: Mutex::new(Vec::new()),
            completed: Mutex::new(0),
            total: AtomicUsize::new(0),
            failures: FailureCollector::new(),
            progress,
        }
    }

    /// Count one more dispatched unit. Returns the new total.
    pub fn record_dispatch(&self) -> usize {
        self.total.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn append(&self, symbols: Vec<Symbol>) {
        if symbols.is_empty() {
            return;
        }
        lock(&self.symbols).extend(symbols);
    }

    /// Mark one unit as completed and report progress.
    ///
    /// The increment and the sink call share one critical section, so the
    /// sink observes 1, 2, 3, ... in order.
    pub fn increment_and_report(&self) -> (usize, usize) {
        let mut completed = lock(&self.completed);
        *completed += 1;
        let total = self.total.load(Ordering::SeqCst).max(*completed);
        self.progress.report(*completed, total);
        (*completed, total)
    }

    pub fn record_failure(&self, failure: UnitFailure) {
        self.failures.record(failure);
    }

    pub fn completed(&self) -> usize {
        *lock(&self.completed)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Take the accumulated symbols and failures.
    pub fn finish(&self) -> SearchReport {
        SearchReport {
            symbols: std::mem::take(&mut *lock(&self.symbols)),
            failures: self.failures.take(),
            packages: self.total(),
        }
    }
}
