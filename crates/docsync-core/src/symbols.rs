//! Symbol extraction from Python sources
//!
//! This module uses tree-sitter to find the top-level definitions of a
//! Python module: functions, async functions and classes. Nested
//! definitions (methods, closures, inner classes) are implementation detail
//! and are never reported.
//!
//! ```
//! use docsync_core::symbols::{ScanOptions, SymbolKind, extract_file};
//!
//! let source = "def foo():\n    return 1\n\nclass Bar:\n    def method(self):\n        pass\n";
//! let symbols = extract_file("pkg/mod.py", source, &ScanOptions::default()).unwrap();
//! assert_eq!(symbols.len(), 2);
//! assert_eq!(symbols[0].name, "foo");
//! assert_eq!(symbols[1].kind, SymbolKind::Class);
//! ```

use crate::error::Error;
use crate::sources::{PathFilter, SourceTree, normalize_rel_path};
use arborium::tree_sitter::{Node, Parser, Tree};
use eyre::Result;
use facet::Facet;
use tracing::{debug, warn};

/// The kind of a top-level definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Facet)]
#[facet(rename_all = "snake_case")]
#[repr(u8)]
pub enum SymbolKind {
    /// `def name(...)`
    Function,
    /// `async def name(...)`
    AsyncFunction,
    /// `class Name`
    Class,
}

impl SymbolKind {
    /// Get the display name for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::AsyncFunction => "async_function",
            SymbolKind::Class => "class",
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A documentable top-level definition
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct SymbolRecord {
    /// Name of the function or class
    pub name: String,
    /// Repository-relative path of the defining file
    pub file: String,
    /// The kind of definition
    pub kind: SymbolKind,
    /// Line of the `def`/`class` keyword (1-indexed)
    pub start_line: usize,
    /// Last line of the definition (1-indexed, best effort)
    pub end_line: usize,
}

impl SymbolRecord {
    /// Public symbols are those whose name does not start with `_`
    pub fn is_public(&self) -> bool {
        !self.name.starts_with('_')
    }
}

/// Options controlling which symbols a scan reports
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// Keep `_`-prefixed names
    pub include_private: bool,
    /// Scan files below `tests` directories
    pub include_tests: bool,
    /// Skip `__init__.py` files that only re-export or document
    pub skip_trivial_init: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_private: false,
            include_tests: false,
            skip_trivial_init: true,
        }
    }
}

/// A file the scanner could not use
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct ScanWarning {
    /// Repository-relative path of the skipped file
    pub file: String,
    /// Why it was skipped
    pub message: String,
}

/// Result of scanning a source root
#[derive(Debug, Clone, Default, Facet)]
pub struct SymbolScan {
    /// The scanned root, repository-relative
    pub source_root: String,
    /// Number of files that passed the path filter
    pub files_scanned: usize,
    /// Symbols in file order, then line order
    pub symbols: Vec<SymbolRecord>,
    /// Files skipped because they could not be read or parsed
    pub warnings: Vec<ScanWarning>,
}

impl SymbolScan {
    /// Number of symbols found
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether no symbols were found
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Walks a source root and collects top-level symbols
#[derive(Debug, Clone)]
pub struct SymbolScanner {
    root: String,
    filter: PathFilter,
    options: ScanOptions,
}

impl SymbolScanner {
    /// Create a scanner for `root` (repository-relative)
    pub fn new(root: impl AsRef<str>, filter: PathFilter, options: ScanOptions) -> Self {
        Self {
            root: normalize_rel_path(root.as_ref()),
            filter: filter.include_tests(options.include_tests),
            options,
        }
    }

    /// Scan every accepted file under the root.
    ///
    /// Fails only when the root itself is missing; unreadable or malformed
    /// files become [`ScanWarning`]s.
    pub fn scan(&self, tree: &dyn SourceTree) -> Result<SymbolScan> {
        if !tree.exists(&self.root) {
            return Err(Error::Configuration(format!(
                "Source root {} does not exist",
                display_root(&self.root)
            ))
            .into());
        }

        let files = tree.list(&self.root, &self.filter)?;
        let mut scan = SymbolScan {
            source_root: self.root.clone(),
            files_scanned: files.len(),
            ..SymbolScan::default()
        };

        for path in files {
            let source = match tree.read(&path) {
                Ok(source) => source,
                Err(err) => {
                    warn!("Skipping {path}: {err:#}");
                    scan.warnings.push(ScanWarning {
                        file: path,
                        message: format!("{err:#}"),
                    });
                    continue;
                }
            };
            match extract_file(&path, &source, &self.options) {
                Ok(symbols) => {
                    debug!("{path}: {} symbols", symbols.len());
                    scan.symbols.extend(symbols);
                }
                Err(err) => {
                    warn!("Skipping {path}: {err}");
                    scan.warnings.push(ScanWarning {
                        file: path,
                        message: err.to_string(),
                    });
                }
            }
        }

        Ok(scan)
    }
}

fn display_root(root: &str) -> &str {
    if root.is_empty() { "." } else { root }
}

/// Extract the top-level symbols of one Python file.
///
/// Returns an error when the file does not parse cleanly.
pub fn extract_file(path: &str, source: &str, options: &ScanOptions) -> Result<Vec<SymbolRecord>> {
    let tree = parse_python(source)?;
    let root = tree.root_node();

    if root.has_error() {
        let line = first_error_line(root).unwrap_or(1);
        return Err(Error::Parse {
            file: normalize_rel_path(path),
            line,
            message: "syntax error".to_string(),
        }
        .into());
    }

    if options.skip_trivial_init && is_trivial_init(path, root) {
        debug!("{path}: trivial __init__, skipped");
        return Ok(Vec::new());
    }

    let file = normalize_rel_path(path);
    let mut symbols = Vec::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        let Some((kind, definition)) = classify(child) else {
            continue;
        };
        let Some(name) = definition
            .child_by_field_name("name")
            .map(|n| source[n.byte_range()].to_string())
        else {
            continue;
        };
        if !options.include_private && name.starts_with('_') {
            continue;
        }
        symbols.push(SymbolRecord {
            name,
            file: file.clone(),
            kind,
            start_line: definition.start_position().row + 1,
            end_line: end_line(definition),
        });
    }

    Ok(symbols)
}

fn parse_python(source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_python::language().into())
        .map_err(|e| eyre::eyre!("Failed to load Python grammar: {e}"))?;
    parser
        .parse(source, None)
        .ok_or_else(|| eyre::eyre!("parser produced no tree"))
}

/// Map a top-level node to a symbol kind and the node carrying the definition.
///
/// Decorated definitions are unwrapped so the reported start line is the
/// `def`/`class` line rather than the first decorator.
fn classify(node: Node) -> Option<(SymbolKind, Node)> {
    match node.kind() {
        "function_definition" if is_async(node) => Some((SymbolKind::AsyncFunction, node)),
        "function_definition" => Some((SymbolKind::Function, node)),
        "class_definition" => Some((SymbolKind::Class, node)),
        "decorated_definition" => node.child_by_field_name("definition").and_then(classify),
        _ => None,
    }
}

fn is_async(node: Node) -> bool {
    let mut cursor = node.walk();
    let first = node.children(&mut cursor).next();
    first.is_some_and(|c| c.kind() == "async")
}

/// Last line of a definition (1-indexed).
///
/// tree-sitter sometimes extends a block's span to column 0 of the next
/// row; in that case the last line actually reached by the subtree is used.
fn end_line(node: Node) -> usize {
    let start_row = node.start_position().row;
    let end = node.end_position();
    if end.column > 0 || end.row == start_row {
        return end.row + 1;
    }
    subtree_last_line(node).max(start_row + 1)
}

fn subtree_last_line(node: Node) -> usize {
    let mut last = node.start_position().row + 1;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let end = child.end_position();
        let line = if end.column > 0 {
            end.row + 1
        } else {
            subtree_last_line(child)
        };
        last = last.max(line);
    }
    last
}

fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            if let Some(line) = first_error_line(child) {
                return Some(line);
            }
        }
    }
    None
}

/// An `__init__.py` whose body is only imports and string literals
fn is_trivial_init(path: &str, root: Node) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    if file_name != "__init__.py" {
        return false;
    }

    let mut cursor = root.walk();
    let trivial = root.children(&mut cursor).all(|stmt| match stmt.kind() {
        "comment" | "import_statement" | "import_from_statement" | "future_import_statement" => {
            true
        }
        "expression_statement" => {
            let mut inner = stmt.walk();
            let mut named = stmt.children(&mut inner).filter(|c| c.is_named());
            named.all(|c| matches!(c.kind(), "string" | "concatenated_string"))
        }
        _ => false,
    });
    trivial
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MemorySources;

    fn extract(source: &str) -> Vec<SymbolRecord> {
        extract_file("pkg/mod.py", source, &ScanOptions::default()).unwrap()
    }

    #[test]
    fn test_top_level_only() {
        let source = r#"import math


def outer(x):
    def inner(y):
        return y

    return inner(x)


class Disk:
    def method(self):
        class Nested:
            pass
        return Nested
"#;
        let symbols = extract(source);
        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["outer", "Disk"]);
        assert_eq!(symbols[0].start_line, 4);
        assert_eq!(symbols[0].end_line, 8);
        assert_eq!(symbols[1].start_line, 11);
        assert_eq!(symbols[1].end_line, 15);
    }

    #[test]
    fn test_kinds() {
        let source = "def a():\n    pass\n\nasync def b():\n    pass\n\nclass C:\n    pass\n";
        let kinds: Vec<SymbolKind> = extract(source).iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SymbolKind::Function,
                SymbolKind::AsyncFunction,
                SymbolKind::Class
            ]
        );
    }

    #[test]
    fn test_decorated_definition_starts_at_def() {
        let source = "import functools\n\n@functools.lru_cache\ndef cached(x):\n    return x\n";
        let symbols = extract(source);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "cached");
        assert_eq!(symbols[0].start_line, 4);
        assert_eq!(symbols[0].end_line, 5);
    }

    #[test]
    fn test_private_filtering() {
        let source = "def _helper():\n    pass\n\ndef public():\n    pass\n";
        let symbols = extract(source);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "public");

        let options = ScanOptions {
            include_private: true,
            ..ScanOptions::default()
        };
        let symbols = extract_file("pkg/mod.py", source, &options).unwrap();
        assert_eq!(symbols.len(), 2);
        assert!(!symbols[0].is_public());
    }

    #[test]
    fn test_end_line_never_before_start() {
        let source = "def one_liner(): return 1\nclass Empty: pass\n";
        for symbol in extract(source) {
            assert!(symbol.end_line >= symbol.start_line, "{symbol:?}");
        }
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = extract_file("pkg/bad.py", "def broken(:\n    pass\n", &ScanOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("syntax error"));
    }

    #[test]
    fn test_trivial_init_skipped() {
        let source = "\"\"\"Package docs.\"\"\"\n# re-exports\nfrom .run import main\nimport os\n";
        let options = ScanOptions::default();
        assert!(
            extract_file("pkg/__init__.py", source, &options)
                .unwrap()
                .is_empty()
        );

        let keep = ScanOptions {
            skip_trivial_init: false,
            ..options
        };
        let with_def = "from .run import main\n\ndef helper():\n    pass\n";
        assert_eq!(
            extract_file("pkg/__init__.py", with_def, &options)
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            extract_file("pkg/__init__.py", with_def, &keep)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_scanner_skips_bad_files_and_tests() {
        let tree = MemorySources::new()
            .add("pkg/a.py", "def foo():\n    pass\n")
            .add("pkg/bad.py", "class (:\n")
            .add("pkg/tests/test_a.py", "def test_foo():\n    pass\n")
            .add("pkg/z.py", "def zed():\n    pass\n");
        let scanner = SymbolScanner::new("pkg", PathFilter::new("py"), ScanOptions::default());
        let scan = scanner.scan(&tree).unwrap();

        assert_eq!(scan.files_scanned, 3);
        let names: Vec<&str> = scan.symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["foo", "zed"]);
        assert_eq!(scan.warnings.len(), 1);
        assert_eq!(scan.warnings[0].file, "pkg/bad.py");

        let with_tests = SymbolScanner::new(
            "pkg",
            PathFilter::new("py"),
            ScanOptions {
                include_tests: true,
                ..ScanOptions::default()
            },
        );
        assert_eq!(with_tests.scan(&tree).unwrap().len(), 3);
    }

    #[test]
    fn test_scanner_missing_root() {
        let tree = MemorySources::new().add("pkg/a.py", "");
        let scanner = SymbolScanner::new("missing", PathFilter::new("py"), ScanOptions::default());
        assert!(scanner.scan(&tree).is_err());
    }
}
