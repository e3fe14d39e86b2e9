//! Artifact rendering and terminal output

use crate::config::Thresholds;
use crate::pipeline::{RunSummary, Severity, StepStatus};
use crate::probe::ProbeReport;
use crate::suggest::Suggestion;
use docsync_core::{
    AnchorScan, CoverageReport, FileCoverage, MismatchRecord, Ratio, SymbolRef, SymbolScan,
    UnresolvedAnchor,
};
use facet::Facet;
use owo_colors::OwoColorize;
use std::collections::BTreeMap;

/// Number of holes listed on the `Next fixes:` line
const NEXT_FIXES: usize = 3;

/// `0.5` -> `50.0%`
pub fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

/// `50.0% (3/6)`, or `N/A` when there was nothing to measure
pub fn format_ratio(ratio: &Ratio) -> String {
    if ratio.is_vacuous() {
        "N/A".to_string()
    } else {
        format!(
            "{} ({}/{})",
            percent(ratio.rate),
            ratio.numerator,
            ratio.denominator
        )
    }
}

/// One-line digest of stale ranges, listing at most `limit` of them
pub fn summarize_mismatches(mismatches: &[MismatchRecord], limit: usize) -> String {
    let mut parts: Vec<String> = mismatches
        .iter()
        .take(limit)
        .map(|m| {
            format!(
                "{}:{} {} expected [{}] found [{}]",
                m.doc,
                m.doc_line,
                m.target(),
                m.expected_range(),
                m.recorded_range()
            )
        })
        .collect();
    if mismatches.len() > limit {
        parts.push(format!("... {} more mismatch(es)", mismatches.len() - limit));
    }
    parts.join("; ")
}

fn with_newline(mut json: String) -> String {
    json.push('\n');
    json
}

// ast_symbols

pub fn render_symbols_json(scan: &SymbolScan) -> String {
    with_newline(facet_json::to_string_pretty(scan).expect("JSON serialization failed"))
}

pub fn render_symbols_markdown(scan: &SymbolScan) -> String {
    let mut output = String::new();
    output.push_str("# Symbol Inventory\n\n");
    output.push_str(&format!(
        "**Source root:** `{}` ({} files, {} symbols)\n\n",
        if scan.source_root.is_empty() {
            "."
        } else {
            scan.source_root.as_str()
        },
        scan.files_scanned,
        scan.len()
    ));

    if !scan.symbols.is_empty() {
        output.push_str("| File | Symbol | Kind | Lines |\n");
        output.push_str("| --- | --- | --- | --- |\n");
        for symbol in &scan.symbols {
            output.push_str(&format!(
                "| `{}` | `{}` | {} | L{}-L{} |\n",
                symbol.file, symbol.name, symbol.kind, symbol.start_line, symbol.end_line
            ));
        }
        output.push('\n');
    }

    if !scan.warnings.is_empty() {
        output.push_str("## Skipped Files\n\n");
        for warning in &scan.warnings {
            output.push_str(&format!("- `{}`: {}\n", warning.file, warning.message));
        }
        output.push('\n');
    }

    output
}

// doc_refs

pub fn render_anchors_json(scan: &AnchorScan) -> String {
    with_newline(facet_json::to_string_pretty(scan).expect("JSON serialization failed"))
}

pub fn render_anchors_markdown(scan: &AnchorScan) -> String {
    let mut output = String::new();
    output.push_str("# Document Anchors\n\n");
    output.push_str(&format!(
        "{} anchors in {} documents\n\n",
        scan.len(),
        scan.doc_paths.len()
    ));

    for doc in &scan.doc_paths {
        let anchors: Vec<_> = scan.anchors.iter().filter(|a| &a.source_doc == doc).collect();
        output.push_str(&format!("## {doc}\n\n"));
        if anchors.is_empty() {
            output.push_str("No anchors.\n\n");
            continue;
        }
        for anchor in anchors {
            let target = match &anchor.symbol {
                Some(symbol) => format!("{}#{}", anchor.file, symbol),
                None => anchor.file.clone(),
            };
            let lines = match anchor.range() {
                Some((start, end)) if start == end => format!(" [L{start}]"),
                Some((start, end)) => format!(" [L{start}-L{end}]"),
                None => String::new(),
            };
            output.push_str(&format!(
                "- line {}: `{}`{}\n",
                anchor.doc_line, target, lines
            ));
        }
        output.push('\n');
    }

    if !scan.missing_docs.is_empty() {
        output.push_str("## Missing Documents\n\n");
        for doc in &scan.missing_docs {
            output.push_str(&format!("- `{doc}`\n"));
        }
        output.push('\n');
    }

    if !scan.unreadable_docs.is_empty() {
        output.push_str("## Unreadable Documents\n\n");
        for skipped in &scan.unreadable_docs {
            output.push_str(&format!("- `{}`: {}\n", skipped.doc, skipped.message));
        }
        output.push('\n');
    }

    if !scan.issues.is_empty() {
        output.push_str("## Issues\n\n");
        for issue in &scan.issues {
            output.push_str(&format!(
                "- `{}:{}` ({}): {}\n",
                issue.doc, issue.doc_line, issue.kind, issue.message
            ));
        }
        output.push('\n');
    }

    output
}

// coverage

/// JSON form of a coverage report with the hole list capped
#[derive(Facet)]
struct JsonCoverage {
    function_reference_rate: Ratio,
    anchor_consistency_rate: Ratio,
    equation_unit_coverage: Ratio,
    callgraph_documented: bool,
    holes: Vec<SymbolRef>,
    holes_total: usize,
    unresolved: Vec<UnresolvedAnchor>,
    mismatches: Vec<MismatchRecord>,
    equations_missing_units: Vec<String>,
    per_file: Vec<FileCoverage>,
}

pub fn render_coverage_json(report: &CoverageReport, hole_sample: usize) -> String {
    let json = JsonCoverage {
        function_reference_rate: report.function_reference_rate,
        anchor_consistency_rate: report.anchor_consistency_rate,
        equation_unit_coverage: report.equation_unit_coverage,
        callgraph_documented: report.callgraph_documented,
        holes: report.holes.iter().take(hole_sample).cloned().collect(),
        holes_total: report.holes.len(),
        unresolved: report.unresolved.clone(),
        mismatches: report.mismatches.clone(),
        equations_missing_units: report.equations_missing_units.clone(),
        per_file: report.per_file.clone(),
    };
    with_newline(facet_json::to_string_pretty(&json).expect("JSON serialization failed"))
}

pub fn render_coverage_markdown(
    report: &CoverageReport,
    thresholds: &Thresholds,
    hole_sample: usize,
) -> String {
    let mut output = String::new();
    output.push_str("# Coverage Snapshot\n\n");

    output.push_str("| Metric | Value | Target |\n");
    output.push_str("| --- | --- | --- |\n");
    output.push_str(&format!(
        "| Function reference rate | {} | {} |\n",
        format_ratio(&report.function_reference_rate),
        percent(thresholds.min_function_rate)
    ));
    output.push_str(&format!(
        "| Anchor consistency rate | {} | {} |\n",
        format_ratio(&report.anchor_consistency_rate),
        percent(thresholds.min_anchor_rate)
    ));
    output.push_str(&format!(
        "| Equation unit coverage | {} | {} |\n",
        format_ratio(&report.equation_unit_coverage),
        percent(thresholds.min_equation_rate)
    ));
    output.push_str(&format!(
        "| Sinks callgraph documented | {} | Yes |\n\n",
        if report.callgraph_documented { "Yes" } else { "No" }
    ));

    output.push_str("## Top Coverage Gaps\n\n");
    if report.holes.is_empty() {
        output.push_str("None.\n\n");
    } else {
        for hole in report.holes.iter().take(hole_sample) {
            output.push_str(&format!("- `{hole}`\n"));
        }
        if report.holes.len() > hole_sample {
            output.push_str(&format!(
                "- ... and {} more (total {})\n",
                report.holes.len() - hole_sample,
                report.holes.len()
            ));
        }
        output.push('\n');
    }

    if !report.mismatches.is_empty() {
        output.push_str("## Stale Line Ranges\n\n");
        output.push_str("| Document | Symbol | Recorded | Expected |\n");
        output.push_str("| --- | --- | --- | --- |\n");
        for m in &report.mismatches {
            output.push_str(&format!(
                "| `{}:{}` | `{}` | {} | {} |\n",
                m.doc,
                m.doc_line,
                m.target(),
                m.recorded_range(),
                m.expected_range()
            ));
        }
        output.push('\n');
    }

    if !report.unresolved.is_empty() {
        output.push_str("## Unresolved Anchors\n\n");
        for u in &report.unresolved {
            let target = match &u.symbol {
                Some(symbol) => format!("{}#{}", u.file, symbol),
                None => u.file.clone(),
            };
            output.push_str(&format!(
                "- `{}:{}` cites `{}` ({})\n",
                u.doc, u.doc_line, target, u.reason
            ));
        }
        output.push('\n');
    }

    if !report.equations_missing_units.is_empty() {
        output.push_str("## Equations Without Units\n\n");
        for title in &report.equations_missing_units {
            output.push_str(&format!("- {title}\n"));
        }
        output.push('\n');
    }

    if !report.per_file.is_empty() {
        output.push_str("## Per File\n\n");
        output.push_str("| File | Referenced | Rate |\n");
        output.push_str("| --- | --- | --- |\n");
        for file in &report.per_file {
            output.push_str(&format!(
                "| `{}` | {}/{} | {} |\n",
                file.file,
                file.referenced,
                file.total,
                percent(file.rate)
            ));
        }
        output.push('\n');
    }

    output
}

// root_cause_probe

pub fn render_probe_json(report: &ProbeReport) -> String {
    with_newline(facet_json::to_string_pretty(report).expect("JSON serialization failed"))
}

pub fn render_probe_markdown(report: &ProbeReport) -> String {
    let mut output = String::new();
    output.push_str("# Root Cause Probe\n\n");

    output.push_str("## Settings\n\n");
    output.push_str(&format!(
        "- Tracked documents: {}\n",
        report.settings.tracked_docs.join(", ")
    ));
    output.push_str(&format!(
        "- Keyword pattern: `{}`\n",
        report.settings.keyword_pattern
    ));
    output.push_str(&format!(
        "- Skip directories: {}\n\n",
        report.settings.skip_dirs.join(", ")
    ));

    output.push_str("## Hypotheses\n\n");
    output.push_str("| ID | Hypothesis | Verdict |\n");
    output.push_str("| --- | --- | --- |\n");
    for h in &report.hypotheses {
        output.push_str(&format!("| {} | {} | {} |\n", h.id, h.title, h.verdict));
    }
    output.push('\n');

    for h in &report.hypotheses {
        output.push_str(&format!("### {}: {}\n\n", h.id, h.title));
        for line in &h.evidence {
            output.push_str(&format!("- {line}\n"));
        }
        output.push('\n');
    }

    output
}

// suggestions_index

#[derive(Facet)]
struct IndexEntry {
    symbol: String,
    file: String,
    suggested_doc: String,
    patch: String,
}

/// Index of patch templates keyed by `file:name`
pub fn render_suggestions_index(suggestions: &[Suggestion]) -> String {
    let index: BTreeMap<String, IndexEntry> = suggestions
        .iter()
        .map(|s| {
            (
                s.key(),
                IndexEntry {
                    symbol: s.symbol.clone(),
                    file: s.file.clone(),
                    suggested_doc: s.suggested_doc.clone(),
                    patch: s.patch.clone(),
                },
            )
        })
        .collect();
    with_newline(facet_json::to_string_pretty(&index).expect("JSON serialization failed"))
}

// summary

pub fn render_summary_json(summary: &RunSummary) -> String {
    with_newline(facet_json::to_string_pretty(summary).expect("JSON serialization failed"))
}

pub fn render_summary_markdown(summary: &RunSummary) -> String {
    let mut output = String::new();
    output.push_str("# Documentation Sync Summary\n\n");
    output.push_str(&format!(
        "**Status:** {} (exit {})\n\n",
        summary.status, summary.exit_code
    ));

    output.push_str("## Step Status\n\n");
    output.push_str("| Step | Status | Messages |\n");
    output.push_str("| --- | --- | --- |\n");
    for step in &summary.steps {
        let notable = step
            .findings
            .iter()
            .filter(|f| f.severity != Severity::Info)
            .count();
        output.push_str(&format!(
            "| {} | {} | {} |\n",
            step.step, step.status, notable
        ));
    }
    output.push('\n');

    output.push_str("## Coverage\n\n");
    match (
        &summary.function_reference_rate,
        &summary.anchor_consistency_rate,
        &summary.equation_unit_coverage,
    ) {
        (Some(functions), Some(anchors), Some(equations)) => {
            output.push_str(&format!("- Function reference rate: {}\n", format_ratio(functions)));
            output.push_str(&format!("- Anchor consistency rate: {}\n", format_ratio(anchors)));
            output.push_str(&format!("- Equation unit coverage: {}\n", format_ratio(equations)));
            if let Some(documented) = summary.callgraph_documented {
                output.push_str(&format!(
                    "- Sinks callgraph documented: {}\n",
                    if documented { "Yes" } else { "No" }
                ));
            }
        }
        _ => output.push_str("No coverage data.\n"),
    }
    output.push('\n');

    if !summary.gaps.is_empty() {
        output.push_str(&format!(
            "### Top Gaps ({} holes total)\n\n",
            summary.holes_total
        ));
        for gap in &summary.gaps {
            output.push_str(&format!("- `{gap}`\n"));
        }
        output.push('\n');
    }

    output.push_str("## Artefacts\n\n");
    for step in &summary.steps {
        for artifact in &step.artifacts {
            output.push_str(&format!("- `{artifact}`\n"));
        }
    }
    output.push('\n');

    output
}

// stderr

/// Print findings, the next holes to fix and the final verdict to stderr
pub fn print_report(summary: &RunSummary) {
    let findings = summary.steps.iter().flat_map(|s| s.findings.iter());
    let (errors, warnings): (Vec<_>, Vec<_>) = findings
        .filter(|f| f.severity != Severity::Info)
        .partition(|f| f.severity == Severity::Error);

    for finding in errors {
        eprintln!("{} {}", "ERROR:".red().bold(), finding.message);
    }
    for finding in warnings {
        eprintln!("{} {}", "WARN:".yellow().bold(), finding.message);
    }

    if summary.function_reference_rate.is_some() {
        let next = if summary.next_fixes.is_empty() {
            "none".to_string()
        } else {
            summary.next_fixes.join(", ")
        };
        eprintln!("Next fixes: {next}");
    }

    let rate = |ratio: &Option<Ratio>| ratio.map_or("n/a".to_string(), |r| percent(r.rate));
    let verdict = if summary.status == StepStatus::Failure {
        "ERROR:".red().bold().to_string()
    } else {
        "OK:".green().bold().to_string()
    };
    eprintln!(
        "{verdict} functions {}, anchors {}, equation units {}",
        rate(&summary.function_reference_rate),
        rate(&summary.anchor_consistency_rate),
        rate(&summary.equation_unit_coverage)
    );
}

/// Holes to list on the `Next fixes:` line
pub fn next_fixes(holes: &[SymbolRef]) -> Vec<String> {
    holes.iter().take(NEXT_FIXES).map(|h| h.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mismatch(doc_line: usize) -> MismatchRecord {
        MismatchRecord {
            doc: "analysis/overview.md".to_string(),
            doc_line,
            file: "marsdisk/grid.py".to_string(),
            symbol: "omega_kepler".to_string(),
            recorded_start: 3,
            recorded_end: 3,
            expected_start: 8,
            expected_end: 10,
        }
    }

    #[test]
    fn test_format_ratio() {
        assert_eq!(format_ratio(&Ratio::new(3, 6)), "50.0% (3/6)");
        assert_eq!(format_ratio(&Ratio::new(0, 0)), "N/A");
        assert_eq!(percent(0.7), "70.0%");
    }

    #[test]
    fn test_summarize_mismatches_limit() {
        let records: Vec<_> = (1..=3).map(mismatch).collect();
        assert_eq!(
            summarize_mismatches(&records[..1], 5),
            "analysis/overview.md:1 marsdisk/grid.py#omega_kepler expected [L8-L10] found [L3]"
        );
        let digest = summarize_mismatches(&records, 2);
        assert!(digest.contains("overview.md:2"));
        assert!(!digest.contains("overview.md:3"));
        assert!(digest.ends_with("... 1 more mismatch(es)"));
    }

    #[test]
    fn test_coverage_markdown_vacuous_rates() {
        let report = CoverageReport {
            function_reference_rate: Ratio::new(0, 0),
            anchor_consistency_rate: Ratio::new(2, 2),
            equation_unit_coverage: Ratio::new(0, 0),
            callgraph_documented: false,
            holes: Vec::new(),
            unresolved: Vec::new(),
            mismatches: Vec::new(),
            equations_missing_units: Vec::new(),
            per_file: Vec::new(),
        };
        let md = render_coverage_markdown(&report, &Thresholds::default(), 10);
        assert!(md.starts_with("# Coverage Snapshot\n"));
        assert!(md.contains("| Function reference rate | N/A | 70.0% |"));
        assert!(md.contains("| Anchor consistency rate | 100.0% (2/2) | 100.0% |"));
        assert!(md.contains("| Sinks callgraph documented | No | Yes |"));
        assert!(md.contains("## Top Coverage Gaps\n\nNone."));
    }

    #[test]
    fn test_coverage_json_caps_holes() {
        let holes: Vec<SymbolRef> = (0..4)
            .map(|i| SymbolRef {
                file: "pkg/a.py".to_string(),
                name: format!("f{i}"),
            })
            .collect();
        let report = CoverageReport {
            function_reference_rate: Ratio::new(0, 4),
            anchor_consistency_rate: Ratio::new(0, 0),
            equation_unit_coverage: Ratio::new(0, 0),
            callgraph_documented: true,
            holes: holes.clone(),
            unresolved: Vec::new(),
            mismatches: Vec::new(),
            equations_missing_units: Vec::new(),
            per_file: Vec::new(),
        };
        let json = render_coverage_json(&report, 2);
        assert!(json.contains("\"f1\""));
        assert!(!json.contains("\"f2\""));
        assert!(json.contains("holes_total"));
        assert!(json.ends_with('\n'));
        assert_eq!(next_fixes(&holes), vec!["pkg/a.py#f0", "pkg/a.py#f1", "pkg/a.py#f2"]);

        let md = render_coverage_markdown(&report, &Thresholds::default(), 2);
        assert!(md.contains("- `pkg/a.py#f1`\n- ... and 2 more (total 4)\n"));
        assert!(!md.contains("pkg/a.py#f2"));

        let md = render_coverage_markdown(&report, &Thresholds::default(), 4);
        assert!(md.contains("pkg/a.py#f3"));
        assert!(!md.contains("more (total"));
    }

    #[test]
    fn test_anchors_markdown_lists_ranges_and_skipped_docs() {
        let (anchors, issues) =
            docsync_core::anchors::parse_anchors("doc.md", "[a.py#foo [L3]] [a.py#bar] [b.py:1-4]");
        let scan = AnchorScan {
            doc_paths: vec!["doc.md".to_string()],
            missing_docs: Vec::new(),
            unreadable_docs: vec![docsync_core::UnreadableDoc {
                doc: "bad.md".to_string(),
                message: "not UTF-8".to_string(),
            }],
            anchors,
            issues,
        };
        let md = render_anchors_markdown(&scan);
        assert!(md.contains("- line 1: `a.py#foo` [L3]\n"));
        assert!(md.contains("- line 1: `a.py#bar`\n"));
        assert!(md.contains("- line 1: `b.py` [L1-L4]\n"));
        assert!(md.contains("## Unreadable Documents\n\n- `bad.md`: not UTF-8\n"));
    }
}
