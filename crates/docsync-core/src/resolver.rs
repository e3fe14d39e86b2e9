//! Name-based resolution of anchors against the current code
//!
//! An anchor cites `file#symbol`; the resolver answers where that symbol
//! lives right now. Each file is parsed at most once per resolver, so a
//! resolver should be created for one pipeline run and then dropped.

use crate::anchors::{DocAnchor, MODULE_SENTINEL};
use crate::sources::{SourceTree, normalize_rel_path};
use crate::symbols::{ScanOptions, SymbolRecord, extract_file};
use std::collections::HashMap;
use tracing::debug;

/// Outcome of resolving one (file, symbol) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The symbol exists and currently spans these lines
    Resolved { start: usize, end: usize },
    /// Whole-module reference; always counts as resolved
    Module,
    /// The cited file is absent or does not parse
    MissingFile,
    /// The file exists but defines no top-level symbol of that name
    MissingSymbol,
}

impl Resolution {
    /// Whether the anchor counts as consistent with the code
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. } | Resolution::Module)
    }

    /// The current range, for named symbols that resolved
    pub fn range(&self) -> Option<(usize, usize)> {
        match *self {
            Resolution::Resolved { start, end } => Some((start, end)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Resolved { .. } => "resolved",
            Resolution::Module => "module",
            Resolution::MissingFile => "missing_file",
            Resolution::MissingSymbol => "missing_symbol",
        }
    }
}

/// Symbols of one file keyed by name; `None` when the file is unusable
type FileTable = Option<HashMap<String, (usize, usize)>>;

/// Memoizing resolver over a source tree
pub struct SymbolResolver<'a> {
    tree: &'a dyn SourceTree,
    cache: HashMap<String, FileTable>,
}

impl<'a> SymbolResolver<'a> {
    pub fn new(tree: &'a dyn SourceTree) -> Self {
        Self {
            tree,
            cache: HashMap::new(),
        }
    }

    /// Resolve a symbol in a file. `None` or the module sentinel always
    /// resolve to [`Resolution::Module`].
    pub fn resolve(&mut self, file: &str, symbol: Option<&str>) -> Resolution {
        let Some(symbol) = symbol.filter(|s| *s != MODULE_SENTINEL) else {
            return Resolution::Module;
        };
        match self.table(file) {
            None => Resolution::MissingFile,
            Some(table) => match table.get(symbol) {
                Some(&(start, end)) => Resolution::Resolved { start, end },
                None => Resolution::MissingSymbol,
            },
        }
    }

    /// Resolve the target of an anchor
    pub fn resolve_anchor(&mut self, anchor: &DocAnchor) -> Resolution {
        self.resolve(&anchor.file, anchor.symbol.as_deref())
    }

    /// Number of files parsed so far
    pub fn cached_files(&self) -> usize {
        self.cache.len()
    }

    fn table(&mut self, file: &str) -> Option<&HashMap<String, (usize, usize)>> {
        let file = normalize_rel_path(file);
        let tree = self.tree;
        self.cache
            .entry(file)
            .or_insert_with_key(|file| build_table(tree, file))
            .as_ref()
    }
}

fn build_table(tree: &dyn SourceTree, file: &str) -> FileTable {
    let options = ScanOptions {
        include_private: true,
        include_tests: true,
        skip_trivial_init: false,
    };
    let source = match tree.read(file) {
        Ok(source) => source,
        Err(err) => {
            debug!("Cannot resolve against {file}: {err:#}");
            return None;
        }
    };
    let symbols = match extract_file(file, &source, &options) {
        Ok(symbols) => symbols,
        Err(err) => {
            debug!("Cannot resolve against {file}: {err}");
            return None;
        }
    };
    Some(index_by_name(symbols))
}

/// Index symbols by name; on collision the first by line order wins.
fn index_by_name(symbols: Vec<SymbolRecord>) -> HashMap<String, (usize, usize)> {
    let mut table = HashMap::new();
    for symbol in symbols {
        table
            .entry(symbol.name)
            .or_insert((symbol.start_line, symbol.end_line));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MemorySources;

    fn tree() -> MemorySources {
        MemorySources::new()
            .add(
                "pkg/a.py",
                "import math\n\ndef foo(x):\n    y = x\n    return y\n\ndef _helper():\n    pass\n",
            )
            .add(
                "pkg/dup.py",
                "def twice():\n    return 1\n\n\ndef twice():\n    return 2\n",
            )
            .add("pkg/broken.py", "def broken(:\n")
    }

    #[test]
    fn test_resolves_public_and_private_symbols() {
        let tree = tree();
        let mut resolver = SymbolResolver::new(&tree);
        assert_eq!(
            resolver.resolve("pkg/a.py", Some("foo")),
            Resolution::Resolved { start: 3, end: 5 }
        );
        assert_eq!(
            resolver.resolve("pkg/a.py", Some("_helper")),
            Resolution::Resolved { start: 7, end: 8 }
        );
    }

    #[test]
    fn test_module_references_always_resolve() {
        let tree = tree();
        let mut resolver = SymbolResolver::new(&tree);
        assert_eq!(resolver.resolve("pkg/nope.py", None), Resolution::Module);
        assert_eq!(
            resolver.resolve("pkg/nope.py", Some(MODULE_SENTINEL)),
            Resolution::Module
        );
        assert_eq!(resolver.cached_files(), 0);
    }

    #[test]
    fn test_missing_file_and_symbol() {
        let tree = tree();
        let mut resolver = SymbolResolver::new(&tree);
        assert_eq!(
            resolver.resolve("pkg/nope.py", Some("foo")),
            Resolution::MissingFile
        );
        assert_eq!(
            resolver.resolve("pkg/broken.py", Some("broken")),
            Resolution::MissingFile
        );
        assert_eq!(
            resolver.resolve("pkg/a.py", Some("bar")),
            Resolution::MissingSymbol
        );
        assert!(!Resolution::MissingSymbol.is_resolved());
    }

    #[test]
    fn test_collision_first_definition_wins() {
        let tree = tree();
        let mut resolver = SymbolResolver::new(&tree);
        assert_eq!(
            resolver.resolve("pkg/dup.py", Some("twice")),
            Resolution::Resolved { start: 1, end: 2 }
        );
    }

    #[test]
    fn test_each_file_parsed_once() {
        let tree = tree();
        let mut resolver = SymbolResolver::new(&tree);
        resolver.resolve("pkg/a.py", Some("foo"));
        resolver.resolve("pkg/a.py", Some("_helper"));
        resolver.resolve("./pkg/a.py", Some("bar"));
        assert_eq!(resolver.cached_files(), 1);
        resolver.resolve("pkg/dup.py", Some("twice"));
        assert_eq!(resolver.cached_files(), 2);
    }
}
