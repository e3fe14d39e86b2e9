//! Stale line ranges in symbol anchors
//!
//! Anchors resolve by name, so a symbol that moved still resolves. What goes
//! stale is the line range written next to it; this module compares the
//! recorded range with the symbol's current span.

use crate::anchors::DocAnchor;
use crate::resolver::SymbolResolver;
use facet::Facet;

/// An anchor whose recorded range disagrees with the code
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct MismatchRecord {
    /// Document containing the anchor
    pub doc: String,
    /// Line of the anchor in the document
    pub doc_line: usize,
    /// Cited file
    pub file: String,
    /// Cited symbol
    pub symbol: String,
    /// First line written in the anchor
    pub recorded_start: usize,
    /// Last line written in the anchor (the start for `[L3]`)
    pub recorded_end: usize,
    /// First line of the symbol now
    pub expected_start: usize,
    /// Last line of the symbol now
    pub expected_end: usize,
}

impl MismatchRecord {
    /// `file#symbol`
    pub fn target(&self) -> String {
        format!("{}#{}", self.file, self.symbol)
    }

    /// The recorded range as written, e.g. `L3-L5` or `L3`
    pub fn recorded_range(&self) -> String {
        if self.recorded_start == self.recorded_end {
            format!("L{}", self.recorded_start)
        } else {
            format!("L{}-L{}", self.recorded_start, self.recorded_end)
        }
    }

    /// The range that should be written, e.g. `L8-L10`
    pub fn expected_range(&self) -> String {
        format!("L{}-L{}", self.expected_start, self.expected_end)
    }
}

/// Compare every named-symbol anchor against the current code.
///
/// Module anchors, anchors without a range and anchors that do not resolve
/// are skipped; the latter are reported as unresolved by coverage instead. Output is sorted by
/// (doc, doc_line).
pub fn detect(anchors: &[DocAnchor], resolver: &mut SymbolResolver<'_>) -> Vec<MismatchRecord> {
    let mut mismatches = Vec::new();

    for anchor in anchors {
        let Some(symbol) = anchor.named_symbol() else {
            continue;
        };
        let Some((recorded_start, recorded_end)) = anchor.range() else {
            continue;
        };
        let Some((start, end)) = resolver.resolve(&anchor.file, Some(symbol)).range() else {
            continue;
        };
        if (recorded_start, recorded_end) != (start, end) {
            mismatches.push(MismatchRecord {
                doc: anchor.source_doc.clone(),
                doc_line: anchor.doc_line,
                file: anchor.file.clone(),
                symbol: symbol.to_string(),
                recorded_start,
                recorded_end,
                expected_start: start,
                expected_end: end,
            });
        }
    }

    mismatches.sort_by(|a, b| (&a.doc, a.doc_line).cmp(&(&b.doc, b.doc_line)));
    mismatches
}
