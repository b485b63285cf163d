use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use gosymbols::cli::Cli;
use gosymbols::config::Config;
use gosymbols::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Usage errors go to stderr with a non-zero exit status
    let cli = Cli::parse();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    // A broken config file fails the run whether it was named or found
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(&cwd)?,
    };
    cli.apply_overrides(&mut config);

    // Held until exit so buffered log lines are flushed
    let _logging_guard = init_logging(&config.logging, &cwd, cli.verbose)?;

    tracing::debug!("Searching {} for {:?}", cli.root.display(), cli.query);

    gosymbols::commands::search::run(&cli.root, &cli.query, cli.progress, &config).await
}
