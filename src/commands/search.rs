//! The search command: run a symbol search and print JSON to stdout.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::indexing::{ProgressSink, SymbolSearch};
use crate::logging::PROGRESS_TARGET;

/// Progress bar on stderr, grown as packages are discovered.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] Packages: [{bar:40.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }
}

impl ProgressSink for BarProgress {
    fn report(&self, completed: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
    }
}

/// Progress as log lines on the progress target.
struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, completed: usize, total: usize) {
        info!(target: PROGRESS_TARGET, "Progress: {}/{}", completed, total);
    }
}

/// Run the search command
///
/// # Arguments
///
/// * `root` - Workspace root to search
/// * `query` - Substring to match, case-insensitively
/// * `show_progress` - Draw a progress bar on stderr
/// * `config` - Loaded configuration with CLI overrides applied
pub async fn run(root: &Path, query: &str, show_progress: bool, config: &Config) -> Result<()> {
    let search = SymbolSearch::from_config(config);

    let bar = show_progress.then(|| Arc::new(BarProgress::new()));
    let progress: Arc<dyn ProgressSink> = match &bar {
        Some(bar) => Arc::clone(bar) as Arc<dyn ProgressSink>,
        None => Arc::new(LogProgress),
    };

    let report = search
        .run_with_progress(root, query, progress)
        .await
        .with_context(|| format!("Symbol search in {} failed", root.display()))?;

    if let Some(bar) = bar {
        bar.bar.finish_and_clear();
    }

    if report.has_failures() {
        report.failure_report().log_summary();
    }

    let json = report.to_json()?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", json).context("Failed to write results")?;
    stdout.flush().context("Failed to write results")?;

    Ok(())
}
