//! Root-cause probe
//!
//! When coverage is low the usual culprits are in the configuration rather
//! than in the documents: a document that is not tracked, a keyword sweep
//! that never mentions the relevant vocabulary, or a skip list that hides
//! the package itself. Each hypothesis gets a verdict and its evidence.

use crate::config::Config;
use docsync_core::CoverageReport;
use facet::Facet;

/// Outcome of one hypothesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Facet)]
#[facet(rename_all = "snake_case")]
#[repr(u8)]
pub enum Verdict {
    /// The suspected cause is not present
    Ok,
    /// The suspected cause is present
    Ng,
    /// The inputs needed to decide are missing
    NoData,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Ok => "OK",
            Verdict::Ng => "NG",
            Verdict::NoData => "no data",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Facet)]
pub struct Hypothesis {
    /// Short identifier (`A`, `B`, ...)
    pub id: String,
    pub title: String,
    pub verdict: Verdict,
    pub evidence: Vec<String>,
}

/// Settings the probe looked at, echoed into the report
#[derive(Debug, Clone, Facet)]
pub struct ProbedSettings {
    pub tracked_docs: Vec<String>,
    pub keyword_pattern: String,
    pub skip_dirs: Vec<String>,
}

#[derive(Debug, Clone, Facet)]
pub struct ProbeReport {
    pub settings: ProbedSettings,
    pub hypotheses: Vec<Hypothesis>,
}

impl ProbeReport {
    /// Whether any hypothesis was confirmed
    pub fn has_findings(&self) -> bool {
        self.hypotheses.iter().any(|h| h.verdict == Verdict::Ng)
    }

    pub fn confirmed(&self) -> impl Iterator<Item = &Hypothesis> {
        self.hypotheses.iter().filter(|h| h.verdict == Verdict::Ng)
    }
}

/// Evaluate every hypothesis against the resolved config and, when
/// available, the coverage report.
pub fn probe(config: &Config, coverage: Option<&CoverageReport>) -> ProbeReport {
    let mut tracked_docs = config.docs.clone();
    tracked_docs.sort();
    let mut skip_dirs = config.skip_dirs.clone();
    skip_dirs.sort();

    ProbeReport {
        hypotheses: vec![
            untracked_documents(&config.probe.required_docs, &tracked_docs),
            narrow_keyword_pattern(&config.probe.keyword_pattern, &config.probe.vocabulary),
            over_filtering(config, &skip_dirs),
            watched_holes(&config.probe.watched_symbols, coverage),
        ],
        settings: ProbedSettings {
            tracked_docs,
            keyword_pattern: config.probe.keyword_pattern.clone(),
            skip_dirs,
        },
    }
}

fn untracked_documents(required: &[String], tracked: &[String]) -> Hypothesis {
    let missing: Vec<String> = required
        .iter()
        .filter(|doc| !tracked.contains(doc))
        .cloned()
        .collect();
    let (verdict, evidence) = if missing.is_empty() {
        (
            Verdict::Ok,
            vec!["All required analysis documents are tracked.".to_string()],
        )
    } else {
        (
            Verdict::Ng,
            vec![format!("Untracked documents: {}", missing.join(", "))],
        )
    };
    Hypothesis {
        id: "A".to_string(),
        title: "Tracked document list".to_string(),
        verdict,
        evidence,
    }
}

fn narrow_keyword_pattern(pattern: &str, vocabulary: &[String]) -> Hypothesis {
    let tokens: Vec<&str> = pattern
        .split('|')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    let mentions = |word: &String| {
        let word = word.to_lowercase();
        tokens.iter().any(|t| t.to_lowercase().contains(&word))
    };
    let covered = vocabulary.is_empty() || vocabulary.iter().any(mentions);

    let mut evidence = vec![format!("Pattern tokens: {}", tokens.join(", "))];
    let verdict = if covered {
        Verdict::Ok
    } else {
        evidence.push(format!(
            "Pattern mentions none of: {}",
            vocabulary.join(", ")
        ));
        Verdict::Ng
    };
    Hypothesis {
        id: "B".to_string(),
        title: "Keyword pattern selectivity".to_string(),
        verdict,
        evidence,
    }
}

fn over_filtering(config: &Config, skip_dirs: &[String]) -> Hypothesis {
    let mut protected: Vec<&str> = Vec::new();
    let tracked_dirs = std::iter::once(config.source_root.as_str())
        .chain(config.docs.iter().filter_map(|d| d.rsplit_once('/').map(|(dir, _)| dir)));
    for dir in tracked_dirs {
        if let Some(top) = dir.split('/').find(|s| !s.is_empty() && *s != ".")
            && !protected.contains(&top)
        {
            protected.push(top);
        }
    }

    let suspicious: Vec<String> = skip_dirs
        .iter()
        .filter(|entry| protected.iter().any(|dir| entry.contains(dir)))
        .cloned()
        .collect();
    let (verdict, evidence) = if suspicious.is_empty() {
        (
            Verdict::Ok,
            vec![format!("No skip entry names {}", protected.join(" or "))],
        )
    } else {
        (
            Verdict::Ng,
            vec![format!("Entries needing review: {}", suspicious.join(", "))],
        )
    };
    Hypothesis {
        id: "C".to_string(),
        title: "Skip-directory exclusions".to_string(),
        verdict,
        evidence,
    }
}

fn watched_holes(watched: &[String], coverage: Option<&CoverageReport>) -> Hypothesis {
    let id = "D".to_string();
    let title = "Watched symbols lacking anchors".to_string();
    let Some(coverage) = coverage else {
        return Hypothesis {
            id,
            title,
            verdict: Verdict::NoData,
            evidence: vec!["Coverage report not available".to_string()],
        };
    };

    let undocumented: Vec<&String> = watched
        .iter()
        .filter(|target| {
            target
                .split_once('#')
                .is_some_and(|(file, name)| coverage.is_hole(file, name))
        })
        .collect();
    let (verdict, evidence) = if undocumented.is_empty() {
        (
            Verdict::Ok,
            vec!["Watched symbols are referenced in the documents.".to_string()],
        )
    } else {
        (
            Verdict::Ng,
            undocumented.iter().map(|t| format!("No anchor: {t}")).collect(),
        )
    };
    Hypothesis {
        id,
        title,
        verdict,
        evidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFile, Overrides, ProbeFile};
    use docsync_core::{
        CoverageReport, EquationScan, MemorySources, PathFilter, ScanOptions, SymbolResolver,
        SymbolScanner,
    };
    use std::path::Path;

    fn config(file: ConfigFile) -> Config {
        Config::resolve(Path::new("/repo"), file, Overrides::default())
    }

    fn verdicts(report: &ProbeReport) -> Vec<(String, Verdict)> {
        report
            .hypotheses
            .iter()
            .map(|h| (h.id.clone(), h.verdict))
            .collect()
    }

    #[test]
    fn test_defaults_flag_keyword_pattern_only() {
        let report = probe(&config(ConfigFile::default()), None);
        assert_eq!(
            verdicts(&report),
            vec![
                ("A".to_string(), Verdict::Ok),
                ("B".to_string(), Verdict::Ng),
                ("C".to_string(), Verdict::Ok),
                ("D".to_string(), Verdict::NoData),
            ]
        );
        assert!(report.has_findings());
    }

    #[test]
    fn test_untracked_docs_and_skipped_package() {
        let report = probe(
            &config(ConfigFile {
                docs: Some(vec!["analysis/overview.md".to_string()]),
                skip_dirs: Some(vec!["__pycache__".to_string(), "marsdisk_old".to_string()]),
                probe: Some(ProbeFile {
                    keyword_pattern: Some("omega_kepler|s_min".to_string()),
                    ..ProbeFile::default()
                }),
                ..ConfigFile::default()
            }),
            None,
        );
        let a = &report.hypotheses[0];
        assert_eq!(a.verdict, Verdict::Ng);
        assert!(a.evidence[0].contains("analysis/run-recipes.md"));
        assert_eq!(report.hypotheses[1].verdict, Verdict::Ok);
        let c = &report.hypotheses[2];
        assert_eq!(c.verdict, Verdict::Ng);
        assert!(c.evidence[0].contains("marsdisk_old"));
    }

    #[test]
    fn test_watched_symbols_against_coverage() {
        let tree = MemorySources::new().add(
            "marsdisk/grid.py",
            "def omega_kepler(r):\n    return r\n\n\ndef v_kepler(r):\n    return r\n",
        );
        let inventory = SymbolScanner::new("marsdisk", PathFilter::new("py"), ScanOptions::default())
            .scan(&tree)
            .unwrap();
        let (anchors, _) =
            docsync_core::anchors::parse_anchors("a.md", "[marsdisk/grid.py#omega_kepler [L1-L2]]");
        let mut resolver = SymbolResolver::new(&tree);
        let coverage = CoverageReport::compute(
            &inventory,
            &anchors,
            &mut resolver,
            &EquationScan::default(),
            true,
        );

        let report = probe(&config(ConfigFile::default()), Some(&coverage));
        let d = &report.hypotheses[3];
        assert_eq!(d.verdict, Verdict::Ng);
        assert_eq!(d.evidence, vec!["No anchor: marsdisk/grid.py#v_kepler"]);
    }
}
