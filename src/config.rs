use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".gosymbols";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of directory listings in flight at once
    #[serde(default = "default_max_concurrent_listings")]
    pub max_concurrent_listings: usize,

    /// Capacity of the channel between the crawler and the extraction pool
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_listings: default_max_concurrent_listings(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_max_concurrent_listings() -> usize {
    20
}

fn default_queue_capacity() -> usize {
    256
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Maximum number of packages parsed concurrently
    #[serde(default = "default_max_concurrent_parses")]
    pub max_concurrent_parses: usize,

    /// Build tags handed to the Go extractor
    #[serde(default)]
    pub build_tags: Vec<String>,

    /// Skip files whose `//go:build` line is not satisfied
    #[serde(default)]
    pub respect_build_constraints: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_parses: default_max_concurrent_parses(),
            build_tags: Vec::new(),
            respect_build_constraints: false,
        }
    }
}

fn default_max_concurrent_parses() -> usize {
    8
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Write logs to a rolling file
    #[serde(default)]
    pub enabled: bool,

    /// Write logs to stderr
    #[serde(default = "default_true")]
    pub stderr: bool,

    /// Level for the file layer: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log directory, relative paths resolve against the working directory
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// hourly, daily, minutely or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            stderr: default_true(),
            level: default_log_level(),
            directory: default_log_directory(),
            file_prefix: default_file_prefix(),
            rotation: default_rotation(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("logs")
}

fn default_file_prefix() -> String {
    "gosymbols.log".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Config {
    /// Load configuration from the .gosymbols directory under `root`.
    ///
    /// A missing file gives the defaults; an unreadable or malformed one is
    /// an error.
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = Self::config_path(root);

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {:?}", config_path))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {:?}", config_path))
    }

    pub fn config_path(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join(CONFIG_FILE)
    }
}
