//! Anchor extraction from documentation
//!
//! Documents cite code with two bracketed forms:
//!
//! - `[marsdisk/grid.py:10-20]` cites a line range of a file
//! - `[marsdisk/grid.py#omega_kepler [L10-L20]]` cites a named symbol and
//!   the range it occupied when the citation was written
//!
//! The end of a range may be omitted (`[a.py:10]`, `[a.py#foo [L10]]`) and
//! then equals the start. The hash form may drop the range entirely
//! (`[a.py#foo]`). An en dash may stand in for the hyphen. The scanner only extracts fields;
//! resolving a citation against the code is the job of
//! [`SymbolResolver`](crate::resolver::SymbolResolver).
//!
//! ```
//! use docsync_core::anchors::parse_anchors;
//!
//! let (anchors, issues) = parse_anchors("notes.md", "See [a.py#foo [L3-L5]].");
//! assert!(issues.is_empty());
//! assert_eq!(anchors[0].symbol.as_deref(), Some("foo"));
//! assert_eq!(anchors[0].range(), Some((3, 5)));
//! ```

use crate::error::Error;
use crate::sources::{SourceTree, normalize_rel_path};
use eyre::Result;
use facet::Facet;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Symbol name that cites a whole module rather than one definition
pub const MODULE_SENTINEL: &str = "__module__";

/// A citation of code found in a document
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct DocAnchor {
    /// Repository-relative path of the citing document
    pub source_doc: String,
    /// Line of the citation inside the document (1-indexed)
    pub doc_line: usize,
    /// Repository-relative path of the cited file
    pub file: String,
    /// Cited symbol, if the hash form was used
    pub symbol: Option<String>,
    /// Recorded first line (the smaller end of the written range); `None`
    /// when the anchor carries no range
    pub line_start: Option<usize>,
    /// Recorded last line (the larger end; the start for single-line ranges)
    pub line_end: Option<usize>,
}

impl DocAnchor {
    /// Whether this anchor cites a whole module (no symbol, or the sentinel)
    pub fn is_module(&self) -> bool {
        self.symbol
            .as_deref()
            .is_none_or(|symbol| symbol == MODULE_SENTINEL)
    }

    /// The recorded `(start, end)` range, if one was written
    pub fn range(&self) -> Option<(usize, usize)> {
        self.line_start.zip(self.line_end)
    }

    /// The cited symbol, unless this is a module anchor
    pub fn named_symbol(&self) -> Option<&str> {
        if self.is_module() {
            None
        } else {
            self.symbol.as_deref()
        }
    }
}

/// Kinds of non-fatal anchor problems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Facet)]
#[facet(rename_all = "snake_case")]
#[repr(u8)]
pub enum IssueKind {
    /// The written range ends before it starts
    ReverseRange,
    /// The same (file, start, end) was already cited in this document
    DuplicateReference,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::ReverseRange => "reverse_range",
            IssueKind::DuplicateReference => "duplicate_reference",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal problem attached to one document
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct AnchorIssue {
    /// What went wrong
    pub kind: IssueKind,
    /// Repository-relative path of the document
    pub doc: String,
    /// Line of the offending citation (1-indexed)
    pub doc_line: usize,
    /// Human-readable description
    pub message: String,
}

/// A document skipped because reading it failed
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct UnreadableDoc {
    pub doc: String,
    pub message: String,
}

/// Result of scanning a set of documents
#[derive(Debug, Clone, Default, Facet)]
pub struct AnchorScan {
    /// Documents that were read, in request order
    pub doc_paths: Vec<String>,
    /// Requested documents that do not exist
    pub missing_docs: Vec<String>,
    /// Documents that exist but could not be read
    pub unreadable_docs: Vec<UnreadableDoc>,
    /// Anchors in document order, then text order
    pub anchors: Vec<DocAnchor>,
    /// Issues in document order, then text order
    pub issues: Vec<AnchorIssue>,
}

impl AnchorScan {
    /// Number of anchors found
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Whether no anchors were found
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

/// Reads a list of documents and extracts their anchors
#[derive(Debug, Clone)]
pub struct AnchorScanner {
    docs: Vec<String>,
}

impl AnchorScanner {
    /// Create a scanner for the given repository-relative document paths
    pub fn new(docs: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Self {
            docs: docs
                .into_iter()
                .map(|d| normalize_rel_path(d.as_ref()))
                .collect(),
        }
    }

    /// Scan every document that exists.
    ///
    /// Missing and unreadable documents are recorded and skipped; the scan
    /// fails only when none of the requested documents could be read.
    pub fn scan(&self, tree: &dyn SourceTree) -> Result<AnchorScan> {
        let mut scan = AnchorScan::default();

        for doc in &self.docs {
            if !tree.exists(doc) {
                warn!("Document {doc} not found, skipping");
                scan.missing_docs.push(doc.clone());
                continue;
            }
            let text = match tree.read(doc) {
                Ok(text) => text,
                Err(err) => {
                    warn!("Skipping {doc}: {err:#}");
                    scan.unreadable_docs.push(UnreadableDoc {
                        doc: doc.clone(),
                        message: format!("{err:#}"),
                    });
                    continue;
                }
            };
            let (anchors, issues) = parse_anchors(doc, &text);
            debug!("{doc}: {} anchors, {} issues", anchors.len(), issues.len());
            scan.doc_paths.push(doc.clone());
            scan.anchors.extend(anchors);
            scan.issues.extend(issues);
        }

        if scan.doc_paths.is_empty() {
            return Err(Error::Configuration(format!(
                "No document paths resolved (requested: {})",
                self.docs.join(", ")
            ))
            .into());
        }

        Ok(scan)
    }
}

/// One citation as written, before normalization
struct RawAnchor {
    offset: usize,
    file: String,
    symbol: Option<String>,
    /// Written `(start, end)`; a missing end repeats the start
    range: Option<(usize, usize)>,
}

/// Extract anchors from one document's text.
///
/// Duplicate detection is scoped to this document: the same citation in
/// two different documents is not an issue.
pub fn parse_anchors(doc: &str, text: &str) -> (Vec<DocAnchor>, Vec<AnchorIssue>) {
    let doc = normalize_rel_path(doc);
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect();
    let get_line = |offset: usize| -> usize {
        match line_starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(line) => line,
        }
    };

    let mut anchors = Vec::new();
    let mut issues = Vec::new();
    let mut seen_ranges: HashSet<(String, usize, usize)> = HashSet::new();
    let mut seen_symbols: HashSet<(String, String)> = HashSet::new();

    let mut pos = 0;
    while let Some(found) = text[pos..].find('[') {
        let open = pos + found;
        let Some((raw, next)) = lex_anchor(text, open) else {
            pos = open + 1;
            continue;
        };
        pos = next;

        let doc_line = get_line(raw.offset);
        let duplicate = match (raw.range, &raw.symbol) {
            (Some((start, end)), _) => {
                if end < start {
                    issues.push(AnchorIssue {
                        kind: IssueKind::ReverseRange,
                        doc: doc.clone(),
                        doc_line,
                        message: format!("line range reversed: {}:{}-{}", raw.file, start, end),
                    });
                }
                (!seen_ranges.insert((raw.file.clone(), start, end)))
                    .then(|| format!("{}:{}-{}", raw.file, start, end))
            }
            (None, Some(symbol)) => (!seen_symbols.insert((raw.file.clone(), symbol.clone())))
                .then(|| format!("{}#{}", raw.file, symbol)),
            (None, None) => None,
        };
        if let Some(target) = duplicate {
            issues.push(AnchorIssue {
                kind: IssueKind::DuplicateReference,
                doc: doc.clone(),
                doc_line,
                message: format!("duplicate reference: {target}"),
            });
        }

        anchors.push(DocAnchor {
            source_doc: doc.clone(),
            doc_line,
            file: raw.file,
            symbol: raw.symbol,
            line_start: raw.range.map(|(start, end)| start.min(end)),
            line_end: raw.range.map(|(start, end)| start.max(end)),
        });
    }

    (anchors, issues)
}

/// Try to lex an anchor starting at the `[` at `open`.
///
/// Returns the anchor and the byte offset just past it.
fn lex_anchor(text: &str, open: usize) -> Option<(RawAnchor, usize)> {
    let mut cursor = Cursor::new(text, open + 1);

    let file = cursor.take_while(|c| !c.is_whitespace() && !matches!(c, '[' | ']' | ':' | '#'));
    if file.len() <= ".py".len() || !file.ends_with(".py") {
        return None;
    }
    let file = normalize_rel_path(file);

    match cursor.bump()? {
        ':' => {
            let start = cursor.number()?;
            let end = if cursor.eat_dash() {
                cursor.number()?
            } else {
                start
            };
            cursor.expect(']')?;
            Some((
                RawAnchor {
                    offset: open,
                    file,
                    symbol: None,
                    range: Some((start, end)),
                },
                cursor.pos,
            ))
        }
        '#' => {
            let symbol = cursor.take_while(|c| !c.is_whitespace() && !matches!(c, '[' | ']'));
            if symbol.is_empty() {
                return None;
            }
            let symbol = symbol.to_string();
            let range = if cursor.eat(']') {
                None
            } else {
                if cursor.take_while(char::is_whitespace).is_empty() {
                    return None;
                }
                cursor.expect('[')?;
                cursor.expect('L')?;
                let start = cursor.number()?;
                let end = if cursor.eat_dash() {
                    cursor.eat('L');
                    cursor.number()?
                } else {
                    start
                };
                cursor.expect(']')?;
                cursor.expect(']')?;
                Some((start, end))
            };
            Some((
                RawAnchor {
                    offset: open,
                    file,
                    symbol: Some(symbol),
                    range,
                },
                cursor.pos,
            ))
        }
        _ => None,
    }
}

/// Minimal character cursor over a text slice
struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str, pos: usize) -> Self {
        Self { text, pos }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Option<()> {
        self.eat(expected).then_some(())
    }

    /// Range separator: hyphen or en dash
    fn eat_dash(&mut self) -> bool {
        self.eat('-') || self.eat('\u{2013}')
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        &self.text[start..self.pos]
    }

    fn number(&mut self) -> Option<usize> {
        let digits = self.take_while(|c| c.is_ascii_digit());
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MemorySources;

    #[test]
    fn test_colon_anchor() {
        let (anchors, issues) = parse_anchors("doc.md", "See [marsdisk/grid.py:10-20] here");
        assert!(issues.is_empty());
        assert_eq!(anchors.len(), 1);
        let anchor = &anchors[0];
        assert_eq!(anchor.file, "marsdisk/grid.py");
        assert_eq!(anchor.symbol, None);
        assert_eq!(anchor.range(), Some((10, 20)));
        assert!(anchor.is_module());
    }

    #[test]
    fn test_colon_anchor_single_line_and_en_dash() {
        let text = "[a.py:7]\n[b.py:3\u{2013}9]";
        let (anchors, _) = parse_anchors("doc.md", text);
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].range(), Some((7, 7)));
        assert_eq!(anchors[1].range(), Some((3, 9)));
        assert_eq!(anchors[1].doc_line, 2);
    }

    #[test]
    fn test_hash_anchor_variants() {
        let text = "[a.py#foo [L3-L5]] [a.py#bar [L8]] [a.py#baz [L1-4]] [a.py#Disk.step [L2\u{2013}L6]]";
        let (anchors, issues) = parse_anchors("doc.md", text);
        assert!(issues.is_empty(), "{issues:?}");
        let fields: Vec<(Option<&str>, Option<(usize, usize)>)> = anchors
            .iter()
            .map(|a| (a.symbol.as_deref(), a.range()))
            .collect();
        assert_eq!(
            fields,
            vec![
                (Some("foo"), Some((3, 5))),
                (Some("bar"), Some((8, 8))),
                (Some("baz"), Some((1, 4))),
                (Some("Disk.step"), Some((2, 6))),
            ]
        );
    }

    #[test]
    fn test_hash_anchor_without_range() {
        let (anchors, issues) = parse_anchors("doc.md", "See [a.py#foo] here, again [a.py#foo].");
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].named_symbol(), Some("foo"));
        assert_eq!((anchors[0].line_start, anchors[0].line_end), (None, None));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::DuplicateReference);
    }

    #[test]
    fn test_module_sentinel() {
        let (anchors, _) = parse_anchors("doc.md", "[a.py#__module__ [L1-L40]]");
        assert!(anchors[0].is_module());
        assert_eq!(anchors[0].named_symbol(), None);
    }

    #[test]
    fn test_non_anchors_are_ignored() {
        let text = "[link](a.py) [a.txt:3] [a.py] [a.py:] [a.py#] [a.py#foo [3-5]] [.py:1] [ a.py:1] [a.py#bar]";
        let (anchors, issues) = parse_anchors("doc.md", text);
        assert_eq!(anchors.len(), 1, "{anchors:?}");
        assert_eq!(anchors[0].symbol.as_deref(), Some("bar"));
        assert!(issues.is_empty());
    }

    #[test]
    fn test_reverse_range_is_normalized() {
        let (anchors, issues) = parse_anchors("doc.md", "text\n[b.py:20-10]");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::ReverseRange);
        assert_eq!(issues[0].doc_line, 2);
        assert_eq!(anchors[0].range(), Some((10, 20)));
    }

    #[test]
    fn test_duplicates_within_one_document() {
        let (anchors, issues) = parse_anchors("doc.md", "[c.py:5-5] and again [c.py:5-5]");
        assert_eq!(anchors.len(), 2);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::DuplicateReference);
    }

    #[test]
    fn test_single_line_anchor_duplicates_explicit_same_range() {
        let (_, issues) = parse_anchors("doc.md", "[c.py:5] [c.py:5-5]");
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_duplicates_across_documents_are_not_flagged() {
        let tree = MemorySources::new()
            .add("docs/one.md", "[c.py:5-5]")
            .add("docs/two.md", "[c.py:5-5]");
        let scan = AnchorScanner::new(["docs/one.md", "docs/two.md"])
            .scan(&tree)
            .unwrap();
        assert_eq!(scan.anchors.len(), 2);
        assert!(scan.issues.is_empty());
    }

    #[test]
    fn test_scanner_missing_documents() {
        let tree = MemorySources::new().add("docs/one.md", "[a.py:1]");
        let scan = AnchorScanner::new(["docs/one.md", "docs/gone.md"])
            .scan(&tree)
            .unwrap();
        assert_eq!(scan.doc_paths, vec!["docs/one.md"]);
        assert_eq!(scan.missing_docs, vec!["docs/gone.md"]);

        assert!(AnchorScanner::new(["docs/gone.md"]).scan(&tree).is_err());
    }

    #[cfg(feature = "walk")]
    #[test]
    fn test_scanner_skips_unreadable_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("docs/nested.md")).unwrap();
        std::fs::write(dir.path().join("docs/good.md"), "[a.py#foo [L1-L2]]").unwrap();
        std::fs::write(dir.path().join("docs/binary.md"), [0xff, 0xfe, b'[', 0x80]).unwrap();
        let tree = crate::sources::WalkSources::new(dir.path());

        let scan = AnchorScanner::new(["docs/binary.md", "docs/good.md", "docs/nested.md"])
            .scan(&tree)
            .unwrap();
        assert_eq!(scan.doc_paths, vec!["docs/good.md"]);
        assert_eq!(scan.anchors.len(), 1);
        let skipped: Vec<&str> = scan.unreadable_docs.iter().map(|u| u.doc.as_str()).collect();
        assert_eq!(skipped, vec!["docs/binary.md", "docs/nested.md"]);

        assert!(AnchorScanner::new(["docs/binary.md"]).scan(&tree).is_err());
    }
}
