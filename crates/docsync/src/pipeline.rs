//! Step orchestration
//!
//! A run executes a fixed sequence of steps. Every step records a status
//! and its findings instead of aborting the run, writes its artifacts
//! before the next step starts, and leaves its in-memory result for the
//! steps that depend on it. A step whose inputs are missing reports
//! "no data" and fails; independent steps still run.

use crate::config::Config;
use crate::output;
use crate::probe::{self, ProbeReport};
use crate::suggest::{self, DocRouter, Suggestion};
use docsync_core::{
    AnchorScan, AnchorScanner, CoverageReport, EquationScan, PathFilter, Ratio, ScanOptions,
    SourceTree, SymbolResolver, SymbolScan, SymbolScanner, WalkSources, callgraph_documented,
    scan_equations,
};
use eyre::{Result, WrapErr};
use facet::Facet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome class of a step, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Facet)]
#[facet(rename_all = "snake_case")]
#[repr(u8)]
pub enum StepStatus {
    Ok = 0,
    Warnings = 1,
    Failure = 2,
}

impl StepStatus {
    /// Process exit code for this status
    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Ok => "ok",
            StepStatus::Warnings => "warnings",
            StepStatus::Failure => "failure",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline steps in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Facet)]
#[facet(rename_all = "snake_case")]
#[repr(u8)]
pub enum Step {
    ScanCode,
    ScanDocs,
    ComputeCoverage,
    ProbeRootCause,
    SuggestAnchors,
    Report,
}

impl Step {
    pub const ALL: [Step; 6] = [
        Step::ScanCode,
        Step::ScanDocs,
        Step::ComputeCoverage,
        Step::ProbeRootCause,
        Step::SuggestAnchors,
        Step::Report,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::ScanCode => "scan_code",
            Step::ScanDocs => "scan_docs",
            Step::ComputeCoverage => "compute_coverage",
            Step::ProbeRootCause => "probe_root_cause",
            Step::SuggestAnchors => "suggest_anchors",
            Step::Report => "report",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Facet)]
#[facet(rename_all = "snake_case")]
#[repr(u8)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A message attached to a step
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Status, findings and written artifacts of one step
#[derive(Debug, Clone, Facet)]
pub struct StepOutcome {
    pub step: Step,
    pub status: StepStatus,
    pub findings: Vec<Finding>,
    /// Repository-relative paths of the files this step wrote
    pub artifacts: Vec<String>,
}

impl StepOutcome {
    fn new(step: Step) -> Self {
        Self {
            step,
            status: StepStatus::Ok,
            findings: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    /// Add a finding and raise the status to match its severity
    fn push(&mut self, finding: Finding) {
        let status = match finding.severity {
            Severity::Info => StepStatus::Ok,
            Severity::Warning => StepStatus::Warnings,
            Severity::Error => StepStatus::Failure,
        };
        self.status = self.status.max(status);
        self.findings.push(finding);
    }
}

/// Flags that change how findings are classified
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Escalate threshold warnings to errors
    pub strict: bool,
    /// Function reference rate below this is an error
    pub fail_under: Option<f64>,
    /// Symbol inventory options
    pub scan: ScanOptions,
}

/// Result of a whole run, as written to `summary.json`
#[derive(Debug, Clone, Facet)]
pub struct RunSummary {
    /// Maximum status over all steps
    pub status: StepStatus,
    pub exit_code: u8,
    pub steps: Vec<StepOutcome>,
    pub function_reference_rate: Option<Ratio>,
    pub anchor_consistency_rate: Option<Ratio>,
    pub equation_unit_coverage: Option<Ratio>,
    pub callgraph_documented: Option<bool>,
    pub strict: bool,
    pub fail_under: Option<f64>,
    /// Worst gaps: holes first, then stale anchors
    pub gaps: Vec<String>,
    /// Total number of holes behind the capped gap list
    pub holes_total: usize,
    /// First holes to document
    pub next_fixes: Vec<String>,
}

/// Drives the steps of one run against a repository
pub struct Pipeline<'a> {
    config: &'a Config,
    options: RunOptions,
    tree: WalkSources,
    inventory: Option<SymbolScan>,
    anchors: Option<AnchorScan>,
    coverage: Option<CoverageReport>,
    probe: Option<ProbeReport>,
    suggestions: Option<Vec<Suggestion>>,
    outcomes: Vec<StepOutcome>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, options: RunOptions) -> Self {
        Self {
            config,
            options,
            tree: WalkSources::new(&config.repo_root),
            inventory: None,
            anchors: None,
            coverage: None,
            probe: None,
            suggestions: None,
            outcomes: Vec::new(),
        }
    }

    /// Run the given steps in pipeline order and return their outcomes
    pub fn run(mut self, steps: &[Step]) -> RunSummary {
        for step in Step::ALL.into_iter().filter(|s| steps.contains(s)) {
            let outcome = self.run_step(step);
            info!("{step}: {}", outcome.status);
            self.outcomes.push(outcome);
        }
        self.summary(None)
    }

    fn run_step(&mut self, step: Step) -> StepOutcome {
        let mut outcome = StepOutcome::new(step);
        let result = match step {
            Step::ScanCode => self.scan_code(&mut outcome),
            Step::ScanDocs => self.scan_docs(&mut outcome),
            Step::ComputeCoverage => self.compute_coverage(&mut outcome),
            Step::ProbeRootCause => self.probe_root_cause(&mut outcome),
            Step::SuggestAnchors => self.suggest_anchors(&mut outcome),
            Step::Report => self.report(&mut outcome),
        };
        if let Err(err) = result {
            outcome.push(Finding::error(format!("{step}: {err:#}")));
        }
        outcome
    }

    fn scan_code(&mut self, outcome: &mut StepOutcome) -> Result<()> {
        let filter = PathFilter::new("py")
            .skip_dirs(self.config.skip_dirs.iter().cloned())
            .exclude(&self.config.exclude)?;
        let scanner = SymbolScanner::new(&self.config.source_root, filter, self.options.scan);
        let inventory = scanner.scan(&self.tree)?;

        for warning in &inventory.warnings {
            outcome.push(Finding::warning(format!(
                "Skipped {}: {}",
                warning.file, warning.message
            )));
        }
        outcome.push(Finding::info(format!(
            "{} symbols in {} files",
            inventory.len(),
            inventory.files_scanned
        )));

        self.write(outcome, "ast_symbols.json", &output::render_symbols_json(&inventory))?;
        self.write(outcome, "ast_symbols.md", &output::render_symbols_markdown(&inventory))?;
        self.inventory = Some(inventory);
        Ok(())
    }

    fn scan_docs(&mut self, outcome: &mut StepOutcome) -> Result<()> {
        let scan = AnchorScanner::new(self.config.markdown_docs()).scan(&self.tree)?;

        for doc in &scan.missing_docs {
            outcome.push(Finding::warning(format!("Document not found: {doc}")));
        }
        for skipped in &scan.unreadable_docs {
            outcome.push(Finding::warning(format!(
                "Document unreadable: {}: {}",
                skipped.doc, skipped.message
            )));
        }
        for issue in &scan.issues {
            outcome.push(Finding::warning(format!(
                "{}:{}: {}",
                issue.doc, issue.doc_line, issue.message
            )));
        }
        outcome.push(Finding::info(format!(
            "{} anchors in {} documents",
            scan.len(),
            scan.doc_paths.len()
        )));

        self.write(outcome, "doc_refs.json", &output::render_anchors_json(&scan))?;
        self.write(outcome, "doc_refs.md", &output::render_anchors_markdown(&scan))?;
        self.anchors = Some(scan);
        Ok(())
    }

    fn compute_coverage(&mut self, outcome: &mut StepOutcome) -> Result<()> {
        let (Some(inventory), Some(anchors)) = (&self.inventory, &self.anchors) else {
            outcome.push(Finding::error(
                "no data: symbol inventory or document anchors unavailable",
            ));
            return Ok(());
        };

        let equations = read_optional(&self.tree, &self.config.equations_doc, outcome)
            .map_or_else(EquationScan::default, |text| scan_equations(&text));
        let callgraph = read_optional(&self.tree, &self.config.callgraph_doc, outcome)
            .is_some_and(|text| callgraph_documented(&text, &self.config.callgraph_required));

        let mut resolver = SymbolResolver::new(&self.tree);
        let report = CoverageReport::compute(
            inventory,
            &anchors.anchors,
            &mut resolver,
            &equations,
            callgraph,
        );
        debug!("Resolved anchors against {} files", resolver.cached_files());

        for finding in evaluate_thresholds(&report, self.config, &self.options) {
            outcome.push(finding);
        }
        if !report.callgraph_documented {
            outcome.push(Finding::info(format!(
                "Call graph in {} is incomplete",
                self.config.callgraph_doc
            )));
        }

        self.write(
            outcome,
            "coverage.json",
            &output::render_coverage_json(&report, self.config.hole_sample),
        )?;
        self.write(
            outcome,
            "coverage.md",
            &output::render_coverage_markdown(
                &report,
                &self.config.thresholds,
                self.config.hole_sample,
            ),
        )?;
        self.coverage = Some(report);
        Ok(())
    }

    fn probe_root_cause(&mut self, outcome: &mut StepOutcome) -> Result<()> {
        let report = probe::probe(self.config, self.coverage.as_ref());
        // NG verdicts only affect the status under --strict
        for hypothesis in report.confirmed() {
            let message = format!(
                "Hypothesis {} ({}): {}",
                hypothesis.id,
                hypothesis.title,
                hypothesis.evidence.join("; ")
            );
            outcome.push(if self.options.strict {
                Finding::warning(message)
            } else {
                Finding::info(message)
            });
        }

        self.write(outcome, "root_cause_probe.json", &output::render_probe_json(&report))?;
        self.write(outcome, "root_cause_probe.md", &output::render_probe_markdown(&report))?;
        self.probe = Some(report);
        Ok(())
    }

    fn suggest_anchors(&mut self, outcome: &mut StepOutcome) -> Result<()> {
        let (Some(inventory), Some(coverage)) = (&self.inventory, &self.coverage) else {
            outcome.push(Finding::error("no data: coverage report unavailable"));
            return Ok(());
        };

        let router = DocRouter::new(
            &self.config.suggestion_rules,
            self.config.suggestion_fallback.clone(),
        )?;
        let patch_dir = self.config.artifact("suggestions");
        let patch_rel = self.config.display_path(&patch_dir);
        let suggestions = suggest::suggest(&router, &coverage.holes, inventory, &patch_rel);

        clear_patches(&patch_dir)?;
        for suggestion in &suggestions {
            let path = self.config.repo_root.join(&suggestion.patch);
            write_file(&path, &suggest::render_patch(suggestion))?;
        }
        outcome.push(Finding::info(format!(
            "{} patch templates in {}",
            suggestions.len(),
            patch_rel
        )));

        self.write(
            outcome,
            "suggestions_index.json",
            &output::render_suggestions_index(&suggestions),
        )?;
        self.suggestions = Some(suggestions);
        Ok(())
    }

    fn report(&mut self, outcome: &mut StepOutcome) -> Result<()> {
        let json = self.config.artifact("summary.json");
        let markdown = self.config.artifact("summary.md");
        outcome.artifacts.push(self.config.display_path(&json));
        outcome.artifacts.push(self.config.display_path(&markdown));

        let summary = self.summary(Some(&*outcome));
        write_file(&json, &output::render_summary_json(&summary))?;
        write_file(&markdown, &output::render_summary_markdown(&summary))?;
        Ok(())
    }

    fn write(&self, outcome: &mut StepOutcome, name: &str, content: &str) -> Result<()> {
        let path = self.config.artifact(name);
        write_file(&path, content)?;
        outcome.artifacts.push(self.config.display_path(&path));
        Ok(())
    }

    /// Summary of the steps run so far, plus the step still in progress
    fn summary(&self, pending: Option<&StepOutcome>) -> RunSummary {
        let steps: Vec<StepOutcome> = self.outcomes.iter().chain(pending).cloned().collect();
        let status = steps
            .iter()
            .map(|o| o.status)
            .max()
            .unwrap_or(StepStatus::Ok);
        let coverage = self.coverage.as_ref();

        let mut gaps: Vec<String> = Vec::new();
        if let Some(coverage) = coverage {
            gaps.extend(coverage.holes.iter().map(|h| h.to_string()));
            gaps.extend(coverage.mismatches.iter().map(|m| {
                format!(
                    "{}:{} {} expected {} found {}",
                    m.doc,
                    m.doc_line,
                    m.target(),
                    m.expected_range(),
                    m.recorded_range()
                )
            }));
        }
        gaps.truncate(self.config.summary_gaps);

        RunSummary {
            status,
            exit_code: status.code(),
            steps,
            function_reference_rate: coverage.map(|c| c.function_reference_rate),
            anchor_consistency_rate: coverage.map(|c| c.anchor_consistency_rate),
            equation_unit_coverage: coverage.map(|c| c.equation_unit_coverage),
            callgraph_documented: coverage.map(|c| c.callgraph_documented),
            strict: self.options.strict,
            fail_under: self.options.fail_under,
            gaps,
            holes_total: coverage.map_or(0, |c| c.holes.len()),
            next_fixes: coverage.map_or_else(Vec::new, |c| output::next_fixes(&c.holes)),
        }
    }
}

/// Compare a coverage report against the configured thresholds.
///
/// Violations are warnings; `strict` turns them into errors and a function
/// rate below `fail_under` is always an error.
pub fn evaluate_thresholds(
    report: &CoverageReport,
    config: &Config,
    options: &RunOptions,
) -> Vec<Finding> {
    let thresholds = &config.thresholds;
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    let anchors = &report.anchor_consistency_rate;
    if anchors.rate < thresholds.min_anchor_rate {
        warnings.push(format!(
            "Anchor consistency rate {} below {} ({}/{})",
            output::percent(anchors.rate),
            output::percent(thresholds.min_anchor_rate),
            anchors.numerator,
            anchors.denominator
        ));
    }

    let functions = &report.function_reference_rate;
    if !functions.is_vacuous() && functions.rate < thresholds.min_function_rate {
        warnings.push(format!(
            "Function reference rate {} below target {} ({}/{})",
            output::percent(functions.rate),
            output::percent(thresholds.min_function_rate),
            functions.numerator,
            functions.denominator
        ));
    }

    let equations = &report.equation_unit_coverage;
    if !equations.is_vacuous() && equations.rate < thresholds.min_equation_rate {
        warnings.push(format!(
            "Equation unit coverage {} below {} ({}/{})",
            output::percent(equations.rate),
            output::percent(thresholds.min_equation_rate),
            equations.numerator,
            equations.denominator
        ));
    }

    if !report.mismatches.is_empty() {
        warnings.push(format!(
            "Anchor line ranges out of date: {}",
            output::summarize_mismatches(&report.mismatches, 5)
        ));
    }

    if let Some(fail_under) = options.fail_under
        && functions.rate < fail_under
    {
        errors.push(format!(
            "Function reference rate {} below --fail-under {}",
            output::percent(functions.rate),
            output::percent(fail_under)
        ));
    }

    let mut findings: Vec<Finding> = errors.into_iter().map(Finding::error).collect();
    if options.strict {
        findings.extend(
            warnings
                .into_iter()
                .map(|w| Finding::error(format!("Strict mode escalation: {w}"))),
        );
    } else {
        findings.extend(warnings.into_iter().map(Finding::warning));
    }
    findings
}

/// Read a document the run can do without; missing is info, unreadable a warning
fn read_optional(tree: &dyn SourceTree, path: &str, outcome: &mut StepOutcome) -> Option<String> {
    if !tree.exists(path) {
        outcome.push(Finding::info(format!("Document {path} not found")));
        return None;
    }
    match tree.read(path) {
        Ok(text) => Some(text),
        Err(err) => {
            warn!("Skipping {path}: {err:#}");
            outcome.push(Finding::warning(format!("Document unreadable: {path}: {err:#}")));
            None
        }
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).wrap_err_with(|| format!("Failed to write {}", path.display()))
}

/// Remove patch templates left over from an earlier run
fn clear_patches(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir).wrap_err_with(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "mdpatch") {
            std::fs::remove_file(&path)
                .wrap_err_with(|| format!("Failed to remove {}", path.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFile, Overrides};
    use docsync_core::{MemorySources, anchors::parse_anchors};

    fn config() -> Config {
        Config::resolve(Path::new("/repo"), ConfigFile::default(), Overrides::default())
    }

    fn report(code: &str, doc: &str) -> CoverageReport {
        let tree = MemorySources::new().add("pkg/a.py", code);
        let inventory = SymbolScanner::new("pkg", PathFilter::new("py"), ScanOptions::default())
            .scan(&tree)
            .unwrap();
        let (anchors, _) = parse_anchors("doc.md", doc);
        let mut resolver = SymbolResolver::new(&tree);
        CoverageReport::compute(
            &inventory,
            &anchors,
            &mut resolver,
            &EquationScan::default(),
            true,
        )
    }

    const CODE: &str = "def foo():\n    pass\n\n\ndef bar():\n    pass\n";

    fn severities(findings: &[Finding]) -> Vec<Severity> {
        findings.iter().map(|f| f.severity).collect()
    }

    #[test]
    fn test_status_ordering() {
        assert!(StepStatus::Ok < StepStatus::Warnings);
        assert!(StepStatus::Warnings < StepStatus::Failure);
        assert_eq!(StepStatus::Failure.code(), 2);

        let mut outcome = StepOutcome::new(Step::ScanCode);
        outcome.push(Finding::info("fine"));
        assert_eq!(outcome.status, StepStatus::Ok);
        outcome.push(Finding::error("bad"));
        outcome.push(Finding::warning("meh"));
        assert_eq!(outcome.status, StepStatus::Failure);
    }

    #[test]
    fn test_clean_report_has_no_findings() {
        let report = report(CODE, "[pkg/a.py#foo [L1-L2]] [pkg/a.py#bar [L5-L6]]");
        assert!(evaluate_thresholds(&report, &config(), &RunOptions::default()).is_empty());
    }

    #[test]
    fn test_threshold_warnings() {
        // 1/2 functions, 1/2 anchors resolve, one stale range
        let report = report(CODE, "[pkg/a.py#foo [L3-L4]] [pkg/a.py#gone [L1]]");
        let findings = evaluate_thresholds(&report, &config(), &RunOptions::default());
        assert_eq!(severities(&findings), vec![Severity::Warning; 3]);
        assert!(findings[0].message.starts_with("Anchor consistency rate 50.0%"));
        assert!(findings[1].message.starts_with("Function reference rate 50.0%"));
        assert!(findings[2].message.contains("expected [L1-L2] found [L3-L4]"));
    }

    #[test]
    fn test_vacuous_rates_are_skipped() {
        let report = report("", "");
        assert!(evaluate_thresholds(&report, &config(), &RunOptions::default()).is_empty());
    }

    #[test]
    fn test_strict_escalates_and_fail_under_errors() {
        let report = report(CODE, "[pkg/a.py#foo [L1-L2]]");
        let strict = RunOptions {
            strict: true,
            ..RunOptions::default()
        };
        let findings = evaluate_thresholds(&report, &config(), &strict);
        assert_eq!(severities(&findings), vec![Severity::Error]);
        assert!(findings[0].message.starts_with("Strict mode escalation"));

        let fail_under = RunOptions {
            fail_under: Some(0.9),
            ..RunOptions::default()
        };
        let findings = evaluate_thresholds(&report, &config(), &fail_under);
        assert_eq!(severities(&findings), vec![Severity::Error, Severity::Warning]);

        let met = RunOptions {
            fail_under: Some(0.5),
            ..RunOptions::default()
        };
        let findings = evaluate_thresholds(&report, &config(), &met);
        assert_eq!(severities(&findings), vec![Severity::Warning]);
    }
    fn repo_config(repo: &Path) -> Config {
        Config::resolve(repo, ConfigFile::default(), Overrides::default())
    }

    #[test]
    fn test_probe_verdicts_are_informational_unless_strict() {
        let repo = tempfile::tempdir().unwrap();
        let config = repo_config(repo.path());

        let summary = Pipeline::new(&config, RunOptions::default()).run(&[Step::ProbeRootCause]);
        let step = &summary.steps[0];
        assert_eq!(step.status, StepStatus::Ok);
        assert!(step.findings.iter().any(|f| f.message.starts_with("Hypothesis B")));
        assert!(step.findings.iter().all(|f| f.severity == Severity::Info));
        assert_eq!(summary.exit_code, 0);

        let strict = RunOptions {
            strict: true,
            ..RunOptions::default()
        };
        let summary = Pipeline::new(&config, strict).run(&[Step::ProbeRootCause]);
        assert_eq!(summary.steps[0].status, StepStatus::Warnings);
        assert_eq!(summary.exit_code, 1);
    }

    #[test]
    fn test_summary_includes_report_step() {
        let repo = tempfile::tempdir().unwrap();
        let config = repo_config(repo.path());

        let summary = Pipeline::new(&config, RunOptions::default()).run(&[Step::Report]);
        assert_eq!(summary.steps.len(), 1);
        assert_eq!(
            summary.steps[0].artifacts,
            vec!["reports/summary.json", "reports/summary.md"]
        );

        let markdown = std::fs::read_to_string(repo.path().join("reports/summary.md")).unwrap();
        assert!(markdown.contains("| report | ok | 0 |"));
        assert!(markdown.contains("- `reports/summary.json`\n- `reports/summary.md`\n"));
        let json = std::fs::read_to_string(repo.path().join("reports/summary.json")).unwrap();
        assert!(json.contains("\"report\""));
        assert!(json.contains("reports/summary.md"));
    }

    #[test]
    fn test_unreadable_optional_document_is_a_warning() {
        let repo = tempfile::tempdir().unwrap();
        std::fs::write(repo.path().join("eq.md"), [0xff, 0xfe, 0x00]).unwrap();
        std::fs::write(repo.path().join("ok.md"), "### E.001\n").unwrap();
        let tree = WalkSources::new(repo.path());
        let mut outcome = StepOutcome::new(Step::ComputeCoverage);

        assert!(read_optional(&tree, "eq.md", &mut outcome).is_none());
        assert_eq!(outcome.status, StepStatus::Warnings);
        assert!(outcome.findings[0].message.starts_with("Document unreadable: eq.md"));

        assert!(read_optional(&tree, "gone.md", &mut outcome).is_none());
        assert_eq!(outcome.findings[1].severity, Severity::Info);
        assert_eq!(
            read_optional(&tree, "ok.md", &mut outcome).as_deref(),
            Some("### E.001\n")
        );
        assert_eq!(outcome.findings.len(), 2);
    }
}
