//! Configuration schema for docsync
//!
//! Config lives at `.config/docsync/config.yaml` relative to the repository
//! root. Every key is optional and falls back to the built-in defaults, so a
//! repository laid out like `marsdisk/` + `analysis/` needs no config at all.
//!
//! ```yaml
//! source_root: marsdisk
//! docs:
//!   - analysis/overview.md
//!   - analysis/run-recipes.md
//! thresholds:
//!   min_function_rate: 0.8
//! suggestions:
//!   rules:
//!     - pattern: "marsdisk/physics/**"
//!       doc: analysis/run-recipes.md
//!   fallback: analysis/overview.md
//! ```

use docsync_core::DEFAULT_SKIP_DIRS;
use eyre::{Result, WrapErr};
use facet::Facet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default location of the config file, relative to the repository root
pub const DEFAULT_CONFIG_PATH: &str = ".config/docsync/config.yaml";

pub const DEFAULT_SOURCE_ROOT: &str = "marsdisk";
pub const DEFAULT_OUTPUT_DIR: &str = "reports";

pub const DEFAULT_DOCS: &[&str] = &[
    "analysis/equations.md",
    "analysis/overview.md",
    "analysis/run-recipes.md",
    "analysis/sinks_callgraph.md",
    "analysis/AI_USAGE.md",
    "analysis/inventory.json",
];

pub const DEFAULT_EQUATIONS_DOC: &str = "analysis/equations.md";
pub const DEFAULT_CALLGRAPH_DOC: &str = "analysis/sinks_callgraph.md";

pub const DEFAULT_CALLGRAPH_REQUIRED: &[&str] = &[
    "marsdisk/run.py#",
    "marsdisk/physics/surface.py#",
    "marsdisk/physics/sinks.py#",
    "marsdisk/physics/sublimation.py#",
];

pub const DEFAULT_REQUIRED_DOCS: &[&str] = &[
    "analysis/overview.md",
    "analysis/run-recipes.md",
    "analysis/sinks_callgraph.md",
];

pub const DEFAULT_KEYWORD_PATTERN: &str = "beta_at_smin|beta_threshold|s_min";
pub const DEFAULT_VOCABULARY: &[&str] = &["omega", "grid"];

pub const DEFAULT_WATCHED_SYMBOLS: &[&str] = &[
    "marsdisk/grid.py#omega_kepler",
    "marsdisk/grid.py#v_kepler",
    "marsdisk/grid.py#omega",
    "marsdisk/grid.py#v_keplerian",
];

pub const DEFAULT_SUGGESTION_RULES: &[(&str, &str)] = &[
    ("marsdisk/grid.py", "analysis/overview.md"),
    ("marsdisk/physics/**", "analysis/run-recipes.md"),
    ("marsdisk/io/**", "analysis/overview.md"),
    ("marsdisk/schema.py", "analysis/overview.md"),
];
pub const DEFAULT_SUGGESTION_FALLBACK: &str = "analysis/run-recipes.md";

/// Config file as written on disk; every field is optional
#[derive(Debug, Clone, Default, Facet)]
pub struct ConfigFile {
    /// Python package to inventory, relative to the repository root
    #[facet(default)]
    pub source_root: Option<String>,

    /// Tracked documents; only `.md` entries are scanned for anchors
    #[facet(default)]
    pub docs: Option<Vec<String>>,

    #[facet(default)]
    pub equations_doc: Option<String>,

    #[facet(default)]
    pub callgraph: Option<CallgraphFile>,

    /// Directory names never descended into
    #[facet(default)]
    pub skip_dirs: Option<Vec<String>>,

    /// Globs of source files to leave out of the inventory
    #[facet(default)]
    pub exclude: Option<Vec<String>>,

    /// Where reports are written, relative to the repository root
    #[facet(default)]
    pub output_dir: Option<String>,

    #[facet(default)]
    pub thresholds: Option<ThresholdsFile>,

    #[facet(default)]
    pub probe: Option<ProbeFile>,

    #[facet(default)]
    pub suggestions: Option<SuggestionsFile>,

    #[facet(default)]
    pub report: Option<ReportFile>,
}

#[derive(Debug, Clone, Default, Facet)]
pub struct CallgraphFile {
    #[facet(default)]
    pub doc: Option<String>,
    /// Strings that must all appear in the generated block
    #[facet(default)]
    pub required: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Facet)]
pub struct ThresholdsFile {
    #[facet(default)]
    pub min_function_rate: Option<f64>,
    #[facet(default)]
    pub min_anchor_rate: Option<f64>,
    #[facet(default)]
    pub min_equation_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, Facet)]
pub struct ProbeFile {
    #[facet(default)]
    pub required_docs: Option<Vec<String>>,
    /// `|`-separated keyword pattern used by the documentation sweep
    #[facet(default)]
    pub keyword_pattern: Option<String>,
    /// Words the keyword pattern is expected to mention
    #[facet(default)]
    pub vocabulary: Option<Vec<String>>,
    /// `file#name` symbols that must not stay undocumented
    #[facet(default)]
    pub watched_symbols: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Facet)]
pub struct SuggestionsFile {
    #[facet(default)]
    pub rules: Option<Vec<SuggestionRule>>,
    #[facet(default)]
    pub fallback: Option<String>,
}

/// Map source files matching `pattern` to the document `doc`
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct SuggestionRule {
    pub pattern: String,
    pub doc: String,
}

#[derive(Debug, Clone, Default, Facet)]
pub struct ReportFile {
    /// Holes listed in `coverage.json`
    #[facet(default)]
    pub hole_sample: Option<usize>,
    /// Gaps listed in the summary
    #[facet(default)]
    pub summary_gaps: Option<usize>,
}

/// Pass/fail thresholds, all rates in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub min_function_rate: f64,
    pub min_anchor_rate: f64,
    pub min_equation_rate: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_function_rate: 0.70,
            min_anchor_rate: 1.0,
            min_equation_rate: 0.90,
        }
    }
}

/// Inputs of the root-cause probe
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSettings {
    pub required_docs: Vec<String>,
    pub keyword_pattern: String,
    pub vocabulary: Vec<String>,
    pub watched_symbols: Vec<String>,
}

/// Values supplied on the command line, which win over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source_root: Option<String>,
    pub docs: Option<Vec<String>>,
    pub output_dir: Option<PathBuf>,
}

/// Fully resolved configuration, passed by reference to every step
#[derive(Debug, Clone)]
pub struct Config {
    pub repo_root: PathBuf,
    pub source_root: String,
    pub docs: Vec<String>,
    pub equations_doc: String,
    pub callgraph_doc: String,
    pub callgraph_required: Vec<String>,
    pub skip_dirs: Vec<String>,
    pub exclude: Vec<String>,
    /// Absolute output directory
    pub output_dir: PathBuf,
    pub thresholds: Thresholds,
    pub probe: ProbeSettings,
    pub suggestion_rules: Vec<SuggestionRule>,
    pub suggestion_fallback: String,
    pub hole_sample: usize,
    pub summary_gaps: usize,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl Config {
    /// Resolve a config file (possibly empty) and command-line overrides
    /// against the built-in defaults.
    pub fn resolve(repo_root: &Path, file: ConfigFile, overrides: Overrides) -> Self {
        let callgraph = file.callgraph.unwrap_or_default();
        let thresholds = file.thresholds.unwrap_or_default();
        let probe = file.probe.unwrap_or_default();
        let suggestions = file.suggestions.unwrap_or_default();
        let report = file.report.unwrap_or_default();
        let defaults = Thresholds::default();

        let output_dir = overrides
            .output_dir
            .or_else(|| file.output_dir.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        Config {
            repo_root: repo_root.to_path_buf(),
            source_root: overrides
                .source_root
                .or(file.source_root)
                .unwrap_or_else(|| DEFAULT_SOURCE_ROOT.to_string()),
            docs: overrides
                .docs
                .or(file.docs)
                .unwrap_or_else(|| strings(DEFAULT_DOCS)),
            equations_doc: file
                .equations_doc
                .unwrap_or_else(|| DEFAULT_EQUATIONS_DOC.to_string()),
            callgraph_doc: callgraph
                .doc
                .unwrap_or_else(|| DEFAULT_CALLGRAPH_DOC.to_string()),
            callgraph_required: callgraph
                .required
                .unwrap_or_else(|| strings(DEFAULT_CALLGRAPH_REQUIRED)),
            skip_dirs: file
                .skip_dirs
                .unwrap_or_else(|| strings(DEFAULT_SKIP_DIRS)),
            exclude: file.exclude.unwrap_or_default(),
            output_dir: repo_root.join(output_dir),
            thresholds: Thresholds {
                min_function_rate: thresholds
                    .min_function_rate
                    .unwrap_or(defaults.min_function_rate),
                min_anchor_rate: thresholds
                    .min_anchor_rate
                    .unwrap_or(defaults.min_anchor_rate),
                min_equation_rate: thresholds
                    .min_equation_rate
                    .unwrap_or(defaults.min_equation_rate),
            },
            probe: ProbeSettings {
                required_docs: probe
                    .required_docs
                    .unwrap_or_else(|| strings(DEFAULT_REQUIRED_DOCS)),
                keyword_pattern: probe
                    .keyword_pattern
                    .unwrap_or_else(|| DEFAULT_KEYWORD_PATTERN.to_string()),
                vocabulary: probe
                    .vocabulary
                    .unwrap_or_else(|| strings(DEFAULT_VOCABULARY)),
                watched_symbols: probe
                    .watched_symbols
                    .unwrap_or_else(|| strings(DEFAULT_WATCHED_SYMBOLS)),
            },
            suggestion_rules: suggestions.rules.unwrap_or_else(|| {
                DEFAULT_SUGGESTION_RULES
                    .iter()
                    .map(|(pattern, doc)| SuggestionRule {
                        pattern: pattern.to_string(),
                        doc: doc.to_string(),
                    })
                    .collect()
            }),
            suggestion_fallback: suggestions
                .fallback
                .unwrap_or_else(|| DEFAULT_SUGGESTION_FALLBACK.to_string()),
            hole_sample: report.hole_sample.unwrap_or(10),
            summary_gaps: report.summary_gaps.unwrap_or(5),
        }
    }

    /// Tracked documents that are scanned for anchors
    pub fn markdown_docs(&self) -> Vec<String> {
        self.docs
            .iter()
            .filter(|doc| doc.ends_with(".md"))
            .cloned()
            .collect()
    }

    /// Output path for an artifact
    pub fn artifact(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    /// `path` relative to the repository root when it lies inside it
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.repo_root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// Load the config for a repository.
///
/// An explicit `path` must exist; the default location is optional.
pub fn load(repo_root: &Path, path: Option<&Path>, overrides: Overrides) -> Result<Config> {
    let file = match path {
        Some(path) => {
            if !path.exists() {
                eyre::bail!("Config file not found at {}", path.display());
            }
            read_config_file(path)?
        }
        None => {
            let default_path = repo_root.join(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                read_config_file(&default_path)?
            } else {
                debug!("No config at {}, using defaults", default_path.display());
                ConfigFile::default()
            }
        }
    };
    Ok(Config::resolve(repo_root, file, overrides))
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    let file: ConfigFile = facet_yaml::from_str(&content)
        .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))?;
    debug!("Loaded config from {}", path.display());
    Ok(file)
}
