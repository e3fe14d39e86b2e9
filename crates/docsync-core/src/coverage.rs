//! Coverage analysis and reporting

use crate::anchors::DocAnchor;
use crate::equations::EquationScan;
use crate::mismatch::{self, MismatchRecord};
use crate::resolver::SymbolResolver;
use crate::sources::{is_test_path, is_within};
use crate::symbols::SymbolScan;
use facet::Facet;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// A metric as (numerator, denominator, rate)
#[derive(Debug, Clone, Copy, PartialEq, Facet)]
pub struct Ratio {
    pub numerator: usize,
    pub denominator: usize,
    /// Always in [0, 1]; 1.0 when the denominator is zero
    pub rate: f64,
}

impl Ratio {
    pub fn new(numerator: usize, denominator: usize) -> Self {
        let rate = if denominator == 0 {
            1.0
        } else {
            numerator.min(denominator) as f64 / denominator as f64
        };
        Self {
            numerator,
            denominator,
            rate,
        }
    }

    /// Whether there was nothing to measure
    pub fn is_vacuous(&self) -> bool {
        self.denominator == 0
    }

    /// Rate as a percentage (0.0 - 100.0)
    pub fn percent(&self) -> f64 {
        self.rate * 100.0
    }
}

/// A (file, name) pair identifying a tracked symbol
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Facet)]
pub struct SymbolRef {
    pub file: String,
    pub name: String,
}

impl std::fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.file, self.name)
    }
}

/// An anchor that does not resolve against the current code
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct UnresolvedAnchor {
    pub doc: String,
    pub doc_line: usize,
    pub file: String,
    pub symbol: Option<String>,
    /// `missing_file` or `missing_symbol`
    pub reason: String,
}

/// Reference coverage of one source file
#[derive(Debug, Clone, PartialEq, Facet)]
pub struct FileCoverage {
    pub file: String,
    /// Public symbols defined in the file
    pub total: usize,
    /// Of those, how many are cited by a symbol anchor
    pub referenced: usize,
    pub rate: f64,
}

/// Coverage analysis results for one pipeline run
#[derive(Debug, Clone, Facet)]
pub struct CoverageReport {
    /// Public symbols cited by at least one symbol anchor
    pub function_reference_rate: Ratio,

    /// Anchors that resolve against the current code
    pub anchor_consistency_rate: Ratio,

    /// `###` equation sections that state units
    pub equation_unit_coverage: Ratio,

    /// Whether the call-graph document covers every required module
    pub callgraph_documented: bool,

    /// Public symbols with no symbol anchor, sorted by (file, name)
    pub holes: Vec<SymbolRef>,

    /// Anchors that do not resolve, sorted by (doc, doc_line)
    pub unresolved: Vec<UnresolvedAnchor>,

    /// Symbol anchors whose recorded range is stale, sorted by (doc, doc_line)
    pub mismatches: Vec<MismatchRecord>,

    /// Equation sections lacking units, in document order
    pub equations_missing_units: Vec<String>,

    /// Per-file breakdown, sorted by file
    pub per_file: Vec<FileCoverage>,
}

impl CoverageReport {
    /// Compute coverage from a symbol inventory and the anchors found in
    /// the documents.
    ///
    /// Only public symbols outside `tests` directories count towards the
    /// function reference rate; the inventory may contain more (e.g. when
    /// private symbols were requested). Thresholds are not applied here.
    pub fn compute(
        inventory: &SymbolScan,
        anchors: &[DocAnchor],
        resolver: &mut SymbolResolver<'_>,
        equations: &EquationScan,
        callgraph_documented: bool,
    ) -> Self {
        let tracked: BTreeSet<SymbolRef> = inventory
            .symbols
            .iter()
            .filter(|s| s.is_public())
            .filter(|s| is_within(&s.file, &inventory.source_root) && !is_test_path(&s.file))
            .map(|s| SymbolRef {
                file: s.file.clone(),
                name: s.name.clone(),
            })
            .collect();

        let cited: HashSet<(&str, &str)> = anchors
            .iter()
            .filter_map(|a| a.named_symbol().map(|name| (a.file.as_str(), name)))
            .collect();

        let mut per_file: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        let mut holes = Vec::new();
        for symbol in &tracked {
            let counts = per_file.entry(symbol.file.as_str()).or_default();
            counts.0 += 1;
            if cited.contains(&(symbol.file.as_str(), symbol.name.as_str())) {
                counts.1 += 1;
            } else {
                holes.push(symbol.clone());
            }
        }
        let referenced = tracked.len() - holes.len();

        let mut unresolved = Vec::new();
        let mut resolved = 0;
        for anchor in anchors {
            let resolution = resolver.resolve_anchor(anchor);
            if resolution.is_resolved() {
                resolved += 1;
            } else {
                unresolved.push(UnresolvedAnchor {
                    doc: anchor.source_doc.clone(),
                    doc_line: anchor.doc_line,
                    file: anchor.file.clone(),
                    symbol: anchor.symbol.clone(),
                    reason: resolution.as_str().to_string(),
                });
            }
        }
        unresolved.sort_by(|a, b| (&a.doc, a.doc_line).cmp(&(&b.doc, b.doc_line)));

        let mismatches = mismatch::detect(anchors, resolver);

        CoverageReport {
            function_reference_rate: Ratio::new(referenced, tracked.len()),
            anchor_consistency_rate: Ratio::new(resolved, anchors.len()),
            equation_unit_coverage: Ratio::new(equations.with_units(), equations.with_equations()),
            callgraph_documented,
            holes,
            unresolved,
            mismatches,
            equations_missing_units: equations
                .missing_units()
                .map(|s| s.title.clone())
                .collect(),
            per_file: per_file
                .into_iter()
                .map(|(file, (total, referenced))| FileCoverage {
                    file: file.to_string(),
                    total,
                    referenced,
                    rate: Ratio::new(referenced, total).rate,
                })
                .collect(),
        }
    }

    /// Whether a symbol is tracked but uncited
    pub fn is_hole(&self, file: &str, name: &str) -> bool {
        self.holes
            .binary_search_by(|h| (h.file.as_str(), h.name.as_str()).cmp(&(file, name)))
            .is_ok()
    }
}
