//! Declaration extraction.
//!
//! An [`Extractor`] turns one package directory into the list of top-level
//! declarations found in its source files. The search pipeline only sees
//! this trait, so any grammar (or a test stub) can sit behind it.

pub mod constraint;
pub mod go;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use constraint::BuildContext;
pub use go::GoExtractor;

/// Syntax kind of a top-level declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    /// A function or method
    Function,
    /// Any named type other than an interface
    TypeDeclaration,
    /// A named interface type
    InterfaceDeclaration,
}

/// A top-level named construct found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    /// Name of the enclosing package, as declared in the file
    pub package: String,
    pub file: PathBuf,
    /// 0-based line of the name
    pub line: usize,
    /// 0-based column of the name
    pub column: usize,
}

/// Errors an extractor may report for a whole directory.
///
/// Per-file problems never surface here; the extractor skips those files.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to read package directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load grammar: {0}")]
    Grammar(String),
}

/// Capability to list the declarations of one package directory.
///
/// Implementations must fail soft: whatever could be parsed is returned,
/// unparseable files are skipped. Calls happen on blocking worker threads.
pub trait Extractor: Send + Sync {
    /// Short identifier used in logs, e.g. "go".
    fn language_id(&self) -> &'static str;

    fn extract(&self, directory: &Path) -> Result<Vec<Declaration>, ExtractError>;
}
