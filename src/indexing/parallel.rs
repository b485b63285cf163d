//! Bounded-concurrency extraction of package units

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use super::aggregator::ResultAggregator;
use super::errors::{FailureStage, UnitFailure};
use super::pipeline::SourceLayout;
use crate::crawler::PackageUnit;
use crate::extractor::Extractor;
use crate::symbol::{Symbol, SymbolQuery};

/// Default ceiling on concurrent package parses.
pub const DEFAULT_MAX_CONCURRENT_PARSES: usize = 8;

/// Turns package units into symbols, a bounded number at a time
#[derive(Clone)]
pub struct ExtractionPool {
    extractor: Arc<dyn Extractor>,
    semaphore: Arc<Semaphore>,
    query: Arc<SymbolQuery>,
    layout: SourceLayout,
    root: Arc<PathBuf>,
    aggregator: Arc<ResultAggregator>,
}

impl ExtractionPool {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        max_concurrent_parses: usize,
        query: SymbolQuery,
        layout: SourceLayout,
        root: PathBuf,
        aggregator: Arc<ResultAggregator>,
    ) -> Self {
        Self {
            extractor,
            semaphore: Arc::new(Semaphore::new(max_concurrent_parses.max(1))),
            query: Arc::new(query),
            layout,
            root: Arc::new(root),
            aggregator,
        }
    }

    /// Count the unit, wait for a parse slot, then run it on `tracker`.
    ///
    /// Waiting here rather than inside the task keeps the number of live
    /// extraction tasks at the semaphore size, and stalls the caller (and
    /// through the bounded channel, the crawler) while the pool is full.
    pub async fn dispatch(&self, unit: PackageUnit, tracker: &TaskTracker) {
        let total = self.aggregator.record_dispatch();
        debug!("Dispatching package {} ({} so far)", unit.import_path, total);

        let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok();
        let pool = self.clone();

        tracker.spawn(async move {
            let _permit = permit;
            pool.process(unit).await;
        });
    }

    /// Extract one unit, append its matches and report progress.
    ///
    /// Returns the number of matching symbols. Never fails: listing and
    /// extraction errors are recorded and the unit counts as empty.
    pub async fn process(&self, unit: PackageUnit) -> usize {
        let symbols = match unit.error {
            Some(error) => {
                warn!("Skipping package {}: {}", unit.import_path, error);
                self.aggregator.record_failure(UnitFailure::new(
                    unit.import_path,
                    FailureStage::Listing,
                    error,
                ));
                Vec::new()
            }
            None => self.extract(&unit.import_path).await,
        };

        let matched = symbols.len();
        self.aggregator.append(symbols);
        self.aggregator.increment_and_report();
        matched
    }

    async fn extract(&self, import_path: &str) -> Vec<Symbol> {
        let dir = self.layout.package_dir(&self.root, import_path);
        let extractor = Arc::clone(&self.extractor);
        let query = Arc::clone(&self.query);

        let result = tokio::task::spawn_blocking(move || {
            extractor
                .extract(&dir)
                .map(|declarations| query.select(declarations))
        })
        .await;

        match result {
            Ok(Ok(symbols)) => {
                debug!("{} matches in {}", symbols.len(), import_path);
                symbols
            }
            Ok(Err(e)) => {
                debug!("No symbols from {}: {}", import_path, e);
                self.aggregator
                    .record_failure(UnitFailure::new(import_path, FailureStage::Extraction, e));
                Vec::new()
            }
            Err(e) => {
                warn!("Extraction of {} panicked: {}", import_path, e);
                self.aggregator
                    .record_failure(UnitFailure::new(import_path, FailureStage::Extraction, e));
                Vec::new()
            }
        }
    }
}
