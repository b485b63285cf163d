//! Errors and per-unit failure diagnostics for a search run

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::warn;

/// Errors that abort a whole search run.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The search root (or its `src` directory) could not be listed.
    #[error("Cannot read search root {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize symbols: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Stage where a package unit failed
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum FailureStage {
    Listing,
    Extraction,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Listing => write!(f, "Listing"),
            FailureStage::Extraction => write!(f, "Extraction"),
        }
    }
}

/// A package that contributed no symbols because something went wrong
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    pub import_path: String,
    pub stage: FailureStage,
    pub message: String,
}

impl UnitFailure {
    pub fn new(import_path: impl Into<String>, stage: FailureStage, message: impl ToString) -> Self {
        Self {
            import_path: import_path.into(),
            stage,
            message: message.to_string(),
        }
    }
}

/// Collects unit failures from concurrent extraction tasks
#[derive(Clone, Default)]
pub struct FailureCollector {
    failures: Arc<Mutex<Vec<UnitFailure>>>,
}

impl FailureCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, failure: UnitFailure) {
        lock(&self.failures).push(failure);
    }

    /// Drain everything collected so far
    pub fn take(&self) -> Vec<UnitFailure> {
        std::mem::take(&mut *lock(&self.failures))
    }
}

/// Failures grouped by stage
pub struct FailureReport {
    pub total: usize,
    pub by_stage: HashMap<FailureStage, Vec<UnitFailure>>,
}

impl FailureReport {
    pub fn from_failures(failures: &[UnitFailure]) -> Self {
        let mut by_stage: HashMap<FailureStage, Vec<UnitFailure>> = HashMap::new();
        for failure in failures {
            by_stage.entry(failure.stage).or_default().push(failure.clone());
        }

        Self {
            total: failures.len(),
            by_stage,
        }
    }

    pub fn summary(&self) -> String {
        if self.total == 0 {
            "All packages were searched".to_string()
        } else {
            format!("{} packages could not be searched", self.total)
        }
    }

    /// Log the failures, at most 5 examples per stage
    pub fn log_summary(&self) {
        if self.total == 0 {
            return;
        }

        warn!("{}", self.summary());
        for (stage, failures) in &self.by_stage {
            warn!("  {}: {} packages", stage, failures.len());
            for failure in failures.iter().take(5) {
                warn!("    - {}: {}", failure.import_path, failure.message);
            }
            if failures.len() > 5 {
                warn!("    ... and {} more", failures.len() - 5);
            }
        }
    }
}

/// Lock a mutex, recovering the data if a panicking task poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
