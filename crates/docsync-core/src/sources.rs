//! Source providers for symbol and anchor extraction
//!
//! Every scanner in this crate reads files through a [`SourceTree`], so the
//! extraction logic can run against an in-memory tree in tests and against
//! the real repository in the CLI. Paths handed to and returned from a tree
//! are always repository-relative and `/`-separated.

use eyre::{Result, WrapErr};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::{BTreeMap, BTreeSet};
#[cfg(feature = "walk")]
use std::path::{Path, PathBuf};

/// Directory names that never contain tracked sources.
pub const DEFAULT_SKIP_DIRS: &[&str] = &[
    ".git",
    ".venv",
    "venv",
    "env",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
    ".idea",
    ".vscode",
    "node_modules",
    "build",
    "dist",
];

/// Predicate deciding which paths under a root are scanned.
#[derive(Debug, Clone)]
pub struct PathFilter {
    extension: String,
    skip_dirs: BTreeSet<String>,
    include_tests: bool,
    exclude: Option<GlobSet>,
}

impl PathFilter {
    /// Filter for files with the given extension (without the dot)
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect(),
            include_tests: false,
            exclude: None,
        }
    }

    /// Replace the set of skipped directory names
    pub fn skip_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.skip_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Keep files that live under a `tests` directory
    pub fn include_tests(mut self, include: bool) -> Self {
        self.include_tests = include;
        self
    }

    /// Add exclude globs, matched against the repository-relative path
    pub fn exclude(mut self, patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(self);
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob =
                Glob::new(pattern).wrap_err_with(|| format!("Invalid exclude glob {pattern}"))?;
            builder.add(glob);
        }
        self.exclude = Some(builder.build().wrap_err("Failed to build exclude globs")?);
        Ok(self)
    }

    /// Whether a directory with this name should be descended into
    pub fn descends_into(&self, dir_name: &str) -> bool {
        !self.skip_dirs.contains(dir_name)
    }

    /// Whether a repository-relative file path passes the filter
    pub fn accepts(&self, rel_path: &str) -> bool {
        let Some((dirs, file_name)) = split_parent(rel_path) else {
            return false;
        };
        if !file_name
            .rsplit_once('.')
            .is_some_and(|(stem, ext)| !stem.is_empty() && ext == self.extension)
        {
            return false;
        }
        for segment in dirs.split('/').filter(|s| !s.is_empty()) {
            if self.skip_dirs.contains(segment) {
                return false;
            }
            if !self.include_tests && segment == "tests" {
                return false;
            }
        }
        !self
            .exclude
            .as_ref()
            .is_some_and(|exclude| exclude.is_match(rel_path))
    }
}

fn split_parent(rel_path: &str) -> Option<(&str, &str)> {
    match rel_path.rsplit_once('/') {
        Some((dirs, name)) if !name.is_empty() => Some((dirs, name)),
        Some(_) => None,
        None if !rel_path.is_empty() => Some(("", rel_path)),
        None => None,
    }
}

/// Normalize a path to the `/`-separated, repository-relative form
pub fn normalize_rel_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let path = path.trim_start_matches("./");
    path.trim_end_matches('/').to_string()
}

/// Whether a repository-relative path lives under a `tests` directory
pub fn is_test_path(rel_path: &str) -> bool {
    split_parent(rel_path)
        .is_some_and(|(dirs, _)| dirs.split('/').any(|segment| segment == "tests"))
}

/// Whether `path` is `root` itself or lies below it (`""` is the whole tree)
pub fn is_within(path: &str, root: &str) -> bool {
    path == root || is_under(path, root)
}

/// A tree of files that scanners can enumerate and read
pub trait SourceTree {
    /// List files under `root` (repository-relative, `""` for the whole tree)
    /// accepted by `filter`, sorted by path
    fn list(&self, root: &str, filter: &PathFilter) -> Result<Vec<String>>;

    /// Read a file as UTF-8
    fn read(&self, path: &str) -> Result<String>;

    /// Whether a file or directory exists
    fn exists(&self, path: &str) -> bool;
}

/// In-memory sources (useful for testing)
#[derive(Debug, Clone, Default)]
pub struct MemorySources(BTreeMap<String, String>);

impl MemorySources {
    /// Create empty memory sources
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with content
    pub fn add(mut self, path: impl AsRef<str>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    /// Insert or replace a file in place
    pub fn insert(&mut self, path: impl AsRef<str>, content: impl Into<String>) {
        self.0
            .insert(normalize_rel_path(path.as_ref()), content.into());
    }
}

impl SourceTree for MemorySources {
    fn list(&self, root: &str, filter: &PathFilter) -> Result<Vec<String>> {
        let root = normalize_rel_path(root);
        if !self.exists(&root) {
            eyre::bail!("Source root {root} does not exist");
        }
        Ok(self
            .0
            .keys()
            .filter(|path| is_under(path, &root))
            .filter(|path| filter.accepts(path))
            .cloned()
            .collect())
    }

    fn read(&self, path: &str) -> Result<String> {
        self.0
            .get(&normalize_rel_path(path))
            .cloned()
            .ok_or_else(|| eyre::eyre!("No such file: {path}"))
    }

    fn exists(&self, path: &str) -> bool {
        let path = normalize_rel_path(path);
        path.is_empty() || self.0.keys().any(|p| p == &path || is_under(p, &path))
    }
}

fn is_under(path: &str, root: &str) -> bool {
    root.is_empty()
        || path
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Filesystem sources rooted at the repository directory
#[cfg(feature = "walk")]
#[derive(Debug, Clone)]
pub struct WalkSources {
    repo_root: PathBuf,
}

#[cfg(feature = "walk")]
impl WalkSources {
    /// Create a source tree for the given repository root
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    /// The repository root this tree reads from
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    fn absolute(&self, rel_path: &str) -> PathBuf {
        let rel = normalize_rel_path(rel_path);
        if rel.is_empty() {
            self.repo_root.clone()
        } else {
            self.repo_root.join(rel)
        }
    }
}

#[cfg(feature = "walk")]
impl SourceTree for WalkSources {
    fn list(&self, root: &str, filter: &PathFilter) -> Result<Vec<String>> {
        use ignore::WalkBuilder;

        let start = self.absolute(root);
        if !start.is_dir() {
            eyre::bail!("Source root {} does not exist", start.display());
        }

        let prune = filter.clone();
        let walker = WalkBuilder::new(&start)
            .follow_links(true)
            .hidden(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !is_dir
                    || entry.depth() == 0
                    || prune.descends_into(&entry.file_name().to_string_lossy())
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry under {}: {err}", start.display());
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.repo_root) else {
                continue;
            };
            let rel = normalize_rel_path(&relative.to_string_lossy());
            if filter.accepts(&rel) {
                files.push(rel);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read(&self, path: &str) -> Result<String> {
        let absolute = self.absolute(path);
        std::fs::read_to_string(&absolute)
            .wrap_err_with(|| format!("Failed to read {}", absolute.display()))
    }

    fn exists(&self, path: &str) -> bool {
        self.absolute(path).exists()
    }
}
