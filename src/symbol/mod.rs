//! Symbol records reported to the caller.

use serde::Serialize;
use std::fmt;

use crate::extractor::{Declaration, DeclarationKind};

/// Kind of a reported symbol, serialized as `func`, `type` or `interface`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Func,
    Type,
    Interface,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Func => "func",
            SymbolKind::Type => "type",
            SymbolKind::Interface => "interface",
        }
    }
}

impl From<DeclarationKind> for SymbolKind {
    fn from(kind: DeclarationKind) -> Self {
        match kind {
            DeclarationKind::Function => SymbolKind::Func,
            DeclarationKind::TypeDeclaration => SymbolKind::Type,
            DeclarationKind::InterfaceDeclaration => SymbolKind::Interface,
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declaration that matched the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub package: String,
    pub path: String,
    /// 0-based line of the declared name
    pub line: usize,
    /// Always 0, columns are not reported
    pub character: usize,
}

impl Symbol {
    pub fn from_declaration(decl: Declaration) -> Self {
        Self {
            name: decl.name,
            kind: decl.kind.into(),
            package: decl.package,
            path: decl.file.to_string_lossy().into_owned(),
            line: decl.line,
            character: 0,
        }
    }
}

/// Case-insensitive substring filter over declaration names.
///
/// The query is lowercased once; an empty query matches every name.
#[derive(Debug, Clone, Default)]
pub struct SymbolQuery {
    needle: String,
}

impl SymbolQuery {
    pub fn new(query: &str) -> Self {
        Self {
            needle: query.to_lowercase(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.needle.is_empty() || name.to_lowercase().contains(&self.needle)
    }

    /// Keep the matching declarations and turn them into symbols.
    pub fn select(&self, declarations: Vec<Declaration>) -> Vec<Symbol> {
        declarations
            .into_iter()
            .filter(|decl| !decl.name.is_empty() && self.matches(&decl.name))
            .map(Symbol::from_declaration)
            .collect()
    }
}
