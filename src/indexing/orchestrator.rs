//! Entry point of a symbol search run.
//!
//! A run moves through `Discovering + Extracting` (the crawler streams units
//! while earlier units are already being parsed) and `Draining` (waiting for
//! the remaining extraction tasks) before the report is returned. There is
//! no cancellation.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use super::aggregator::{NoProgress, ProgressSink, ResultAggregator};
use super::errors::SearchError;
use super::parallel::{ExtractionPool, DEFAULT_MAX_CONCURRENT_PARSES};
use super::pipeline::{SearchReport, SourceLayout};
use crate::config::Config;
use crate::crawler::{DirectoryCrawler, Filesystem, OsFilesystem, DEFAULT_MAX_CONCURRENT_LISTINGS};
use crate::extractor::{BuildContext, Extractor, GoExtractor};
use crate::symbol::SymbolQuery;

/// Concurrency limits of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub max_concurrent_listings: usize,
    pub max_concurrent_parses: usize,
    pub queue_capacity: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_concurrent_listings: DEFAULT_MAX_CONCURRENT_LISTINGS,
            max_concurrent_parses: DEFAULT_MAX_CONCURRENT_PARSES,
            queue_capacity: 256,
        }
    }
}

impl From<&Config> for SearchOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_concurrent_listings: config.crawler.max_concurrent_listings,
            max_concurrent_parses: config.extraction.max_concurrent_parses,
            queue_capacity: config.crawler.queue_capacity,
        }
    }
}

/// Searches a workspace for declarations whose name contains a query.
///
/// Holds no per-run state, so one instance can serve concurrent runs.
pub struct SymbolSearch {
    fs: Arc<dyn Filesystem>,
    extractor: Arc<dyn Extractor>,
    options: SearchOptions,
}

impl SymbolSearch {
    pub fn new(extractor: Arc<dyn Extractor>, options: SearchOptions) -> Self {
        Self {
            fs: Arc::new(OsFilesystem),
            extractor,
            options,
        }
    }

    /// Go search configured from `config`, build tags included.
    pub fn from_config(config: &Config) -> Self {
        let build = BuildContext::new(
            config.extraction.build_tags.iter().cloned(),
            config.extraction.respect_build_constraints,
        );
        Self::new(Arc::new(GoExtractor::new(build)), SearchOptions::from(config))
    }

    /// Replace the filesystem used for listing directories.
    pub fn with_filesystem(mut self, fs: Arc<dyn Filesystem>) -> Self {
        self.fs = fs;
        self
    }

    pub async fn run(&self, root: &Path, query: &str) -> Result<SearchReport, SearchError> {
        self.run_with_progress(root, query, Arc::new(NoProgress)).await
    }

    /// Search `root`, reporting `(completed, total)` to `progress` after
    /// every package.
    pub async fn run_with_progress(
        &self,
        root: &Path,
        query: &str,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<SearchReport, SearchError> {
        let start = Instant::now();
        let query = SymbolQuery::new(query);

        let root_entries = self
            .fs
            .read_dir(root)
            .await
            .map_err(|source| SearchError::RootUnreadable {
                path: root.to_path_buf(),
                source,
            })?;
        let layout = SourceLayout::detect(&root_entries);
        debug!(
            "Searching {} with {:?} layout ({} extractor)",
            root.display(),
            layout,
            self.extractor.language_id()
        );

        let aggregator = Arc::new(ResultAggregator::new(progress));
        let pool = ExtractionPool::new(
            Arc::clone(&self.extractor),
            self.options.max_concurrent_parses,
            query,
            layout,
            root.to_path_buf(),
            Arc::clone(&aggregator),
        );
        let crawler = DirectoryCrawler::new(
            Arc::clone(&self.fs),
            self.options.max_concurrent_listings,
            self.options.queue_capacity,
        );

        let mut units = crawler.crawl(layout.source_roots(root));
        let tracker = TaskTracker::new();

        while let Some(unit) = units.recv().await {
            if unit.is_root() {
                if let Some(error) = unit.error {
                    return Err(SearchError::RootUnreadable {
                        path: error.path,
                        source: error.source,
                    });
                }
                continue;
            }
            pool.dispatch(unit, &tracker).await;
        }

        debug!("Crawl finished, draining {} extraction tasks", tracker.len());
        tracker.close();
        tracker.wait().await;

        let report = aggregator.finish();
        info!(
            "{} in {:.2}s",
            report.summary(),
            start.elapsed().as_secs_f64()
        );

        Ok(report)
    }
}
