//! Concurrent symbol search pipeline

pub mod aggregator;
pub mod errors;
pub mod orchestrator;
pub mod parallel;
pub mod pipeline;

pub use aggregator::{NoProgress, ProgressSink, ResultAggregator};
pub use errors::{FailureCollector, FailureReport, FailureStage, SearchError, UnitFailure};
pub use orchestrator::{SearchOptions, SymbolSearch};
pub use parallel::{ExtractionPool, DEFAULT_MAX_CONCURRENT_PARSES};
pub use pipeline::{SearchReport, SourceLayout};
