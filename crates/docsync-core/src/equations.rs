//! Equation-document checks
//!
//! The equations document is split into `###` sections. A section that
//! contains equations (fenced `math`/`latex` blocks or `$$...$$` display
//! math) is expected to state units in brackets somewhere inside one of
//! those equations, e.g. `\Sigma \; [kg\,m^{-2}]`.
//!
//! The call-graph document carries a generated block between
//! `<!-- AUTOGEN ... -->` and `AUTOGEN-END -->`; [`callgraph_documented`]
//! checks that every required module prefix appears in it.

use facet::Facet;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

const AUTOGEN_BEGIN: &str = "<!-- AUTOGEN";
const AUTOGEN_END: &str = "AUTOGEN-END -->";

/// One `###` section of the equations document
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct EquationSection {
    /// Heading text
    pub title: String,
    /// Line of the heading (1-indexed)
    pub line: usize,
    /// Whether the section contains at least one equation
    pub has_equations: bool,
    /// Whether any equation carries a bracketed unit
    pub has_units: bool,
}

/// All level-3 sections of an equations document, in document order
#[derive(Debug, Clone, Default, Facet)]
pub struct EquationScan {
    pub sections: Vec<EquationSection>,
}

impl EquationScan {
    /// Sections that contain equations
    pub fn with_equations(&self) -> usize {
        self.sections.iter().filter(|s| s.has_equations).count()
    }

    /// Sections whose equations carry units
    pub fn with_units(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| s.has_equations && s.has_units)
            .count()
    }

    /// Sections with equations but no units, in document order
    pub fn missing_units(&self) -> impl Iterator<Item = &EquationSection> {
        self.sections
            .iter()
            .filter(|s| s.has_equations && !s.has_units)
    }
}

/// Split a Markdown document into `###` sections and classify each.
///
/// Content before the first level-3 heading is ignored. Lower-level
/// headings do not end a section.
pub fn scan_equations(markdown: &str) -> EquationScan {
    let line_of = |offset: usize| markdown[..offset].matches('\n').count() + 1;

    let mut scan = EquationScan::default();
    let mut in_heading = false;
    let mut math_block: Option<String> = None;

    for (event, range) in Parser::new_ext(markdown, Options::ENABLE_MATH).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H3,
                ..
            }) => {
                in_heading = true;
                scan.sections.push(EquationSection {
                    title: String::new(),
                    line: line_of(range.start),
                    has_equations: false,
                    has_units: false,
                });
            }
            Event::End(TagEnd::Heading(HeadingLevel::H3)) => in_heading = false,
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                let lang = info.split_whitespace().next().unwrap_or("");
                if lang.eq_ignore_ascii_case("math") || lang.eq_ignore_ascii_case("latex") {
                    math_block = Some(String::new());
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(body) = math_block.take()
                    && let Some(section) = scan.sections.last_mut()
                {
                    record_equation(section, &body);
                }
            }
            Event::DisplayMath(body) => {
                if let Some(section) = scan.sections.last_mut() {
                    record_equation(section, &body);
                }
            }
            Event::Text(text) | Event::Code(text) | Event::InlineMath(text) => {
                if let Some(body) = math_block.as_mut() {
                    body.push_str(&text);
                } else if in_heading && let Some(section) = scan.sections.last_mut() {
                    section.title.push_str(&text);
                }
            }
            _ => {}
        }
    }

    for section in &mut scan.sections {
        section.title = section.title.trim().to_string();
    }
    scan
}

fn record_equation(section: &mut EquationSection, body: &str) {
    section.has_equations = true;
    section.has_units |= has_unit_brackets(body);
}

/// Whether the text contains a `[...]` token with a letter inside
pub fn has_unit_brackets(text: &str) -> bool {
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        let Some(close) = after.find(']') else {
            return false;
        };
        if after[..close].chars().any(|c| c.is_ascii_alphabetic()) {
            return true;
        }
        rest = after;
    }
    false
}

/// The generated block of a call-graph document, if it has one.
///
/// A missing end marker extends the block to the end of the document.
pub fn autogen_block(text: &str) -> Option<&str> {
    let begin = text.find(AUTOGEN_BEGIN)?;
    let body_start = begin + text[begin..].find("-->")? + "-->".len();
    let body = &text[body_start..];
    let block = match body.find(AUTOGEN_END) {
        Some(end) => &body[..end],
        None => body,
    };
    Some(block.trim())
}

/// Whether every required string appears in the generated block (or in the
/// whole document when the block is absent or empty)
pub fn callgraph_documented(text: &str, required: &[String]) -> bool {
    let haystack = autogen_block(text)
        .filter(|block| !block.is_empty())
        .unwrap_or(text);
    required.iter().all(|needle| haystack.contains(needle.as_str()))
}
