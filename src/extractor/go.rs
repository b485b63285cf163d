//! Go declaration extractor backed by tree-sitter.
//!
//! Reports top-level `func` declarations (methods included) and every type
//! spec of a top-level `type` declaration, grouped or not.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use tree_sitter::{Node, Parser, Tree};

use super::{BuildContext, Declaration, DeclarationKind, ExtractError, Extractor};

/// Go language declaration extractor.
#[derive(Debug, Clone, Default)]
pub struct GoExtractor {
    build: BuildContext,
}

impl GoExtractor {
    pub fn new(build: BuildContext) -> Self {
        Self { build }
    }

    /// List the `.go` files directly inside `directory`, sorted by name.
    fn source_files(directory: &Path) -> Result<Vec<PathBuf>, ExtractError> {
        let entries = fs::read_dir(directory).map_err(|source| ExtractError::ReadDir {
            path: directory.to_path_buf(),
            source,
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|ft| !ft.is_dir()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| path.extension().map(|ext| ext == "go").unwrap_or(false))
            .collect();
        files.sort();

        Ok(files)
    }

    fn new_parser() -> Result<Parser, ExtractError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| ExtractError::Grammar(e.to_string()))?;
        Ok(parser)
    }

    /// Extract declarations from one parsed file.
    fn declarations_in(&self, tree: &Tree, source: &[u8], file: &Path) -> Vec<Declaration> {
        let root = tree.root_node();
        let Some(package) = package_name(&root, source) else {
            debug!("No package clause in {:?}, skipping", file);
            return Vec::new();
        };

        let mut declarations = Vec::new();
        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            match node.kind() {
                "function_declaration" | "method_declaration" => {
                    if let Some(decl) =
                        declaration(&node, DeclarationKind::Function, &package, file, source)
                    {
                        declarations.push(decl);
                    }
                }
                "type_declaration" => {
                    let mut specs = node.walk();
                    for spec in node.named_children(&mut specs) {
                        if !matches!(spec.kind(), "type_spec" | "type_alias") {
                            continue;
                        }
                        let kind = match spec.child_by_field_name("type").map(|t| t.kind()) {
                            Some("interface_type") => DeclarationKind::InterfaceDeclaration,
                            _ => DeclarationKind::TypeDeclaration,
                        };
                        if let Some(decl) = declaration(&spec, kind, &package, file, source) {
                            declarations.push(decl);
                        }
                    }
                }
                _ => {}
            }
        }

        declarations
    }
}

impl Extractor for GoExtractor {
    fn language_id(&self) -> &'static str {
        "go"
    }

    fn extract(&self, directory: &Path) -> Result<Vec<Declaration>, ExtractError> {
        let files = Self::source_files(directory)?;
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let mut parser = Self::new_parser()?;
        let mut declarations = Vec::new();

        for file in files {
            // Raw bytes: stray non-UTF-8 in comments or literals must not hide the file
            let source = match fs::read(&file) {
                Ok(source) => source,
                Err(e) => {
                    debug!("Could not read {:?}: {}", file, e);
                    continue;
                }
            };

            if !self.build.allows(&source) {
                trace!("Build constraints exclude {:?}", file);
                continue;
            }

            let Some(tree) = parser.parse(&source, None) else {
                debug!("Parser gave up on {:?}", file);
                continue;
            };
            if tree.root_node().has_error() {
                // Partial trees still yield the declarations that did parse
                trace!("Syntax errors in {:?}", file);
            }

            declarations.extend(self.declarations_in(&tree, &source, &file));
        }

        Ok(declarations)
    }
}

fn package_name(root: &Node, source: &[u8]) -> Option<String> {
    let mut cursor = root.walk();
    let clause = root
        .named_children(&mut cursor)
        .find(|child| child.kind() == "package_clause")?;
    let ident = clause.named_child(0)?;
    Some(node_text(&ident, source).to_string())
}

fn declaration(
    node: &Node,
    kind: DeclarationKind,
    package: &str,
    file: &Path,
    source: &[u8],
) -> Option<Declaration> {
    let name = node.child_by_field_name("name")?;
    let text = node_text(&name, source);
    if text.is_empty() {
        return None;
    }

    let position = name.start_position();
    Some(Declaration {
        name: text.to_string(),
        kind,
        package: package.to_string(),
        file: file.to_path_buf(),
        line: position.row,
        column: position.column,
    })
}

fn node_text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    std::str::from_utf8(&source[node.start_byte()..node.end_byte()]).unwrap_or("")
}
