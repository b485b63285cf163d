use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "gosymbols")]
#[command(author, version, about = "Print package-level Go symbols matching a query")]
pub struct Cli {
    /// Workspace root: a GOPATH-style directory with src/, or a plain source tree
    pub root: PathBuf,

    /// Case-insensitive substring to look for in symbol names (empty matches all)
    #[arg(default_value = "")]
    pub query: String,

    /// Build tags handed to the Go parser, comma separated
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Skip files whose //go:build line is not satisfied by the tags
    #[arg(long)]
    pub respect_build_constraints: bool,

    /// Show a progress bar on stderr
    #[arg(long)]
    pub progress: bool,

    /// Config file (default: .gosymbols/config.toml in the working directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum concurrent directory listings
    #[arg(long)]
    pub listing_limit: Option<usize>,

    /// Maximum concurrent package parses
    #[arg(long)]
    pub parse_limit: Option<usize>,

    /// Debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if !self.tags.is_empty() {
            config.extraction.build_tags = self.tags.clone();
        }
        if self.respect_build_constraints {
            config.extraction.respect_build_constraints = true;
        }
        if let Some(limit) = self.listing_limit {
            config.crawler.max_concurrent_listings = limit;
        }
        if let Some(limit) = self.parse_limit {
            config.extraction.max_concurrent_parses = limit;
        }
    }
}
