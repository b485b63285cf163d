//! Data carried through a search run

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::errors::{FailureReport, SearchError, UnitFailure};
use crate::crawler::DirEntryInfo;
use crate::symbol::Symbol;

/// Where package directories live relative to the search root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLayout {
    /// Packages sit directly under the root
    Flat,
    /// GOPATH style: packages sit under `<root>/src`
    SrcPrefixed,
}

impl SourceLayout {
    /// Pick the layout from the root's own listing.
    pub fn detect(root_entries: &[DirEntryInfo]) -> Self {
        if root_entries.iter().any(|entry| entry.is_dir && entry.name == "src") {
            SourceLayout::SrcPrefixed
        } else {
            SourceLayout::Flat
        }
    }

    /// Directories the crawler starts from.
    pub fn source_roots(&self, root: &Path) -> Vec<PathBuf> {
        match self {
            SourceLayout::Flat => vec![root.to_path_buf()],
            SourceLayout::SrcPrefixed => vec![root.join("src")],
        }
    }

    /// Absolute directory of a package.
    pub fn package_dir(&self, root: &Path, import_path: &str) -> PathBuf {
        let base = match self {
            SourceLayout::Flat => root.to_path_buf(),
            SourceLayout::SrcPrefixed => root.join("src"),
        };
        import_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(base, |dir, segment| dir.join(segment))
    }
}

/// Outcome of one search run.
#[derive(Debug, Default)]
pub struct SearchReport {
    /// Matches, in no particular order
    pub symbols: Vec<Symbol>,
    /// Packages that could not be listed or extracted
    pub failures: Vec<UnitFailure>,
    /// Number of packages dispatched for extraction
    pub packages: usize,
}

impl SearchReport {
    /// Serialize the symbols as an indented JSON array.
    pub fn to_json(&self) -> Result<String, SearchError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.symbols.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn failure_report(&self) -> FailureReport {
        FailureReport::from_failures(&self.failures)
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Found {} symbols in {} packages ({} failed)",
            self.symbols.len(),
            self.packages,
            self.failures.len()
        )
    }
}
