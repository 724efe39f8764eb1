//! Lazy walk of a tests directory.
//!
//! A file is collected when its name matches one of the configured file
//! patterns (`test_*`, `conftest.py`, ...) or when any directory between the
//! tests dir and the file matches one of the artifact-directory patterns
//! (`sit_tests`, `sprint*`, `fixtures`, ...). Artifact directories match
//! without regard to case, so `Sprint6_Login` counts as a sprint folder.
//! Ignored directories are pruned before descent. Entries are visited in
//! file-name order.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use walkdir::{DirEntry, WalkDir};

use crate::config::ScanConfig;
use crate::error::{Result, TmigError};

/// Compiled name predicates.
#[derive(Debug, Clone)]
pub struct ScanFilter {
    file_patterns: Vec<Pattern>,
    artifact_dirs: Vec<Pattern>,
    ignore_dirs: Vec<Pattern>,
    ignore_files: Vec<Pattern>,
}

impl ScanFilter {
    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        Ok(Self {
            file_patterns: compile("scan.file_patterns", &config.file_patterns)?,
            artifact_dirs: compile("scan.artifact_dirs", &config.artifact_dirs)?,
            ignore_dirs: compile("scan.ignore_dirs", &config.ignore_dirs)?,
            ignore_files: compile("scan.ignore_files", &config.ignore_files)?,
        })
    }

    fn any(patterns: &[Pattern], name: &str) -> bool {
        patterns.iter().any(|p| p.matches(name))
    }

    fn is_artifact_dir(&self, name: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::new()
        };
        self.artifact_dirs
            .iter()
            .any(|p| p.matches_with(name, options))
    }

    #[must_use]
    pub fn is_ignored_dir(&self, name: &str) -> bool {
        Self::any(&self.ignore_dirs, name)
    }

    /// Whether a file at `relative` (below the tests dir) is collected.
    #[must_use]
    pub fn accepts(&self, relative: &Path) -> bool {
        let Some(name) = relative.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };
        if Self::any(&self.ignore_files, &name) {
            return false;
        }
        if Self::any(&self.file_patterns, &name) {
            return true;
        }
        relative
            .parent()
            .into_iter()
            .flat_map(Path::components)
            .any(|component| self.is_artifact_dir(&component.as_os_str().to_string_lossy()))
    }
}

fn compile(key: &str, patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|raw| {
            Pattern::new(raw).map_err(|err| TmigError::Config(format!("{key} '{raw}': {err}")))
        })
        .collect()
}

/// Walks `<project_root>/<tests_dir>` and yields matching files relative to
/// the project root.
#[derive(Debug, Clone)]
pub struct Scanner {
    project_root: PathBuf,
    tests_dir: PathBuf,
    filter: ScanFilter,
    follow_links: bool,
    max_depth: Option<usize>,
}

impl Scanner {
    /// Validate the tests directory and build a scanner.
    ///
    /// Fails with `PathNotFound`, `NotADirectory` or `PermissionDenied` when
    /// the tests directory cannot be listed.
    pub fn new(project_root: &Path, config: &ScanConfig) -> Result<Self> {
        let tests_dir = project_root.join(&config.tests_dir);
        let meta = fs::metadata(&tests_dir).map_err(|err| TmigError::from_io(err, &tests_dir))?;
        if !meta.is_dir() {
            return Err(TmigError::NotADirectory(tests_dir));
        }
        fs::read_dir(&tests_dir).map_err(|err| TmigError::from_io(err, &tests_dir))?;

        Ok(Self {
            project_root: project_root.to_path_buf(),
            tests_dir,
            filter: ScanFilter::from_config(config)?,
            follow_links: config.follow_links,
            max_depth: config.max_depth,
        })
    }

    #[must_use]
    pub fn tests_dir(&self) -> &Path {
        &self.tests_dir
    }

    /// Lazily walk the tree.
    #[must_use]
    pub fn scan(&self) -> ScanIter {
        let mut walker = WalkDir::new(&self.tests_dir)
            .follow_links(self.follow_links)
            .sort_by_file_name();
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        let filter = self.filter.clone();
        let entries = walker
            .into_iter()
            .filter_entry(move |entry| !is_pruned(&filter, entry));

        ScanIter {
            entries: Box::new(entries),
            project_root: self.project_root.clone(),
            tests_dir: self.tests_dir.clone(),
            filter: self.filter.clone(),
            follow_links: self.follow_links,
            seen: HashSet::new(),
        }
    }
}

fn is_pruned(filter: &ScanFilter, entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && filter.is_ignored_dir(&entry.file_name().to_string_lossy())
}

/// Iterator over collected files. Errors for unreadable entries below the
/// root are yielded; symlink loops are skipped.
pub struct ScanIter {
    entries: Box<dyn Iterator<Item = walkdir::Result<DirEntry>>>,
    project_root: PathBuf,
    tests_dir: PathBuf,
    filter: ScanFilter,
    follow_links: bool,
    seen: HashSet<PathBuf>,
}

impl ScanIter {
    fn accept(&mut self, entry: &DirEntry) -> Option<PathBuf> {
        if !entry.file_type().is_file() {
            return None;
        }
        let path = entry.path();
        let below_tests = path.strip_prefix(&self.tests_dir).ok()?;
        if !self.filter.accepts(below_tests) {
            return None;
        }
        if self.follow_links {
            // The same file reached through a linked directory is reported once.
            let real = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            if !self.seen.insert(real) {
                tracing::debug!(path = %path.display(), "skipping file already reached via another link");
                return None;
            }
        }
        path.strip_prefix(&self.project_root)
            .ok()
            .map(Path::to_path_buf)
    }
}

impl Iterator for ScanIter {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.entries.next()? {
                Ok(entry) => {
                    if let Some(path) = self.accept(&entry) {
                        return Some(Ok(path));
                    }
                }
                Err(err) => {
                    if let Some(ancestor) = err.loop_ancestor() {
                        tracing::debug!(
                            path = ?err.path(),
                            ancestor = %ancestor.display(),
                            "skipping symlink cycle"
                        );
                        continue;
                    }
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    return Some(Err(match err.into_io_error() {
                        Some(io_err) if io_err.kind() == io::ErrorKind::PermissionDenied => {
                            TmigError::PermissionDenied(path)
                        }
                        Some(io_err) => TmigError::Scan(format!("{}: {io_err}", path.display())),
                        None => TmigError::Scan(format!("{}: walk failed", path.display())),
                    }));
                }
            }
        }
    }
}
