//! docsync-core - Core library for documentation/code consistency analysis
//!
//! This crate provides the building blocks for:
//! - Inventorying the top-level functions and classes of a Python source tree
//! - Extracting the anchors that analysis documents use to cite that code
//! - Resolving anchors by name and flagging stale line ranges
//! - Computing reference, consistency and equation-unit coverage
//!
//! # Features
//!
//! - `walk` - Enable [`WalkSources`] for filesystem walking (brings in `ignore`)
//!
//! # Anchors
//!
//! Documents cite code with one of two bracketed forms:
//!
//! ```text
//! [marsdisk/grid.py:10-20]                   line range of a file
//! [marsdisk/grid.py#omega_kepler [L10-L20]]  named symbol and its range
//! ```
//!
//! # Computing coverage
//!
//! ```
//! use docsync_core::{
//!     AnchorScanner, CoverageReport, EquationScan, MemorySources, PathFilter, ScanOptions,
//!     SymbolResolver, SymbolScanner,
//! };
//!
//! let tree = MemorySources::new()
//!     .add("pkg/a.py", "import math\n\ndef foo(x):\n    y = x\n    return y\n")
//!     .add("docs/notes.md", "See [pkg/a.py#foo [L3-L5]].");
//!
//! let inventory = SymbolScanner::new("pkg", PathFilter::new("py"), ScanOptions::default())
//!     .scan(&tree)
//!     .unwrap();
//! let anchors = AnchorScanner::new(["docs/notes.md"]).scan(&tree).unwrap();
//!
//! let mut resolver = SymbolResolver::new(&tree);
//! let report = CoverageReport::compute(
//!     &inventory,
//!     &anchors.anchors,
//!     &mut resolver,
//!     &EquationScan::default(),
//!     false,
//! );
//! assert_eq!(report.function_reference_rate.rate, 1.0);
//! assert!(report.mismatches.is_empty());
//! ```

pub mod anchors;
pub mod coverage;
pub mod equations;
mod error;
pub mod mismatch;
pub mod resolver;
mod sources;
pub mod symbols;

pub use anchors::{
    AnchorIssue, AnchorScan, AnchorScanner, DocAnchor, IssueKind, MODULE_SENTINEL, UnreadableDoc,
};
pub use coverage::{CoverageReport, FileCoverage, Ratio, SymbolRef, UnresolvedAnchor};
pub use equations::{EquationScan, EquationSection, callgraph_documented, scan_equations};
pub use error::Error;
pub use mismatch::MismatchRecord;
pub use resolver::{Resolution, SymbolResolver};
pub use sources::{
    DEFAULT_SKIP_DIRS, MemorySources, PathFilter, SourceTree, is_test_path, is_within,
    normalize_rel_path,
};
pub use symbols::{ScanOptions, ScanWarning, SymbolKind, SymbolRecord, SymbolScan, SymbolScanner};

#[cfg(feature = "walk")]
pub use sources::WalkSources;
