//! Anchor suggestions for undocumented symbols
//!
//! Every hole gets a patch template naming the document it most likely
//! belongs in. Templates are written next to the reports and never applied;
//! a maintainer copies the anchor into the document by hand.

use crate::config::SuggestionRule;
use docsync_core::{SymbolKind, SymbolRef, SymbolScan};
use eyre::{Result, WrapErr};
use facet::Facet;
use std::collections::HashMap;

/// Ordered glob rules mapping a source file to a target document
pub struct DocRouter {
    rules: Vec<(globset::GlobMatcher, String)>,
    fallback: String,
}

impl DocRouter {
    pub fn new(rules: &[SuggestionRule], fallback: impl Into<String>) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                let matcher = globset::GlobBuilder::new(&rule.pattern)
                    .literal_separator(true)
                    .build()
                    .wrap_err_with(|| format!("Invalid suggestion pattern '{}'", rule.pattern))?
                    .compile_matcher();
                Ok((matcher, rule.doc.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            rules,
            fallback: fallback.into(),
        })
    }

    /// Target document for a source file; the first matching rule wins
    pub fn route(&self, file: &str) -> &str {
        self.rules
            .iter()
            .find(|(matcher, _)| matcher.is_match(file))
            .map(|(_, doc)| doc.as_str())
            .unwrap_or(self.fallback.as_str())
    }
}

/// One suggested anchor
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct Suggestion {
    pub symbol: String,
    pub file: String,
    pub kind: Option<SymbolKind>,
    pub start_line: usize,
    pub end_line: usize,
    pub suggested_doc: String,
    /// Path of the patch template, relative to the repository root
    pub patch: String,
}

impl Suggestion {
    /// Key used in the suggestion index
    pub fn key(&self) -> String {
        format!("{}:{}", self.file, self.symbol)
    }

    /// The anchor a maintainer would paste into the document
    pub fn anchor(&self) -> String {
        format!(
            "[{}#{} [L{}-L{}]]",
            self.file, self.symbol, self.start_line, self.end_line
        )
    }
}

/// File-system friendly name for a symbol's patch template
pub fn slug(file: &str, name: &str) -> String {
    format!("{}__{}", file.replace('/', "__").replace('.', "_"), name)
}

/// Build one suggestion per hole, in hole order.
///
/// `patch_dir` is the repository-relative directory the templates will be
/// written to.
pub fn suggest(
    router: &DocRouter,
    holes: &[SymbolRef],
    inventory: &SymbolScan,
    patch_dir: &str,
) -> Vec<Suggestion> {
    let spans: HashMap<(&str, &str), (SymbolKind, usize, usize)> = inventory
        .symbols
        .iter()
        .map(|s| {
            (
                (s.file.as_str(), s.name.as_str()),
                (s.kind, s.start_line, s.end_line),
            )
        })
        .rev()
        .collect();

    holes
        .iter()
        .map(|hole| {
            let span = spans.get(&(hole.file.as_str(), hole.name.as_str()));
            Suggestion {
                symbol: hole.name.clone(),
                file: hole.file.clone(),
                kind: span.map(|(kind, _, _)| *kind),
                start_line: span.map_or(1, |(_, start, _)| *start),
                end_line: span.map_or(1, |(_, _, end)| *end),
                suggested_doc: router.route(&hole.file).to_string(),
                patch: format!("{}/{}.mdpatch", patch_dir, slug(&hole.file, &hole.name)),
            }
        })
        .collect()
}

/// Patch template adding an anchor for the suggested symbol
pub fn render_patch(suggestion: &Suggestion) -> String {
    let doc = &suggestion.suggested_doc;
    let what = match suggestion.kind {
        Some(SymbolKind::Class) => "class",
        _ => "function",
    };
    let mut output = String::new();
    output.push_str(&format!("--- a/{doc}\n"));
    output.push_str(&format!("+++ b/{doc}\n"));
    output.push_str("@@\n");
    output.push_str(&format!(
        "+#### TODO: document `{}` in the analysis notes\n",
        suggestion.symbol
    ));
    output.push_str(&format!(
        "+Reference: {} summarizes the {what} `{}` and where it is used.\n",
        suggestion.anchor(),
        suggestion.symbol
    ));
    output.push_str(
        "+Context: explain its role in the disk simulation and which reported outputs depend on it.\n",
    );
    output.push_str("+\n");
    output
}
