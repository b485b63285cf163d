pub mod cli;
pub mod commands;
pub mod config;
pub mod crawler;
pub mod extractor;
pub mod indexing;
pub mod logging;
pub mod symbol;

pub use config::Config;
pub use indexing::{SearchError, SearchReport, SymbolSearch};
pub use symbol::{Symbol, SymbolKind};
