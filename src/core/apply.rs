//! Execute a [`MigrationPlan`].
//!
//! Best effort and non-transactional: every move is attempted, each outcome
//! is recorded, and a failure never stops the remaining moves. Nothing is
//! ever overwritten.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::core::plan::{MigrationPlan, PlannedMove};
use crate::error::{ErrorCode, Result, TmigError};

const CONFTEST_STUB: &str = "\"\"\"Shared fixtures for this test category.\"\"\"\n";

/// Executor switches.
#[derive(Debug, Clone, Copy)]
pub struct ApplyOptions {
    /// Compare SHA-256 of source and destination around every move.
    pub verify_content: bool,
    /// Remove source directories left empty, up to the tests dir.
    pub prune_empty_dirs: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            verify_content: true,
            prune_empty_dirs: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MoveStatus {
    Moved,
    Failed { code: ErrorCode, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveOutcome {
    pub source: PathBuf,
    pub destination: PathBuf,
    #[serde(flatten)]
    pub status: MoveStatus,
}

impl MoveOutcome {
    #[must_use]
    pub const fn is_moved(&self) -> bool {
        matches!(self.status, MoveStatus::Moved)
    }
}

/// Result of one apply run, file by file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    pub outcomes: Vec<MoveOutcome>,
    pub directories_created: Vec<PathBuf>,
    pub scaffolded: Vec<PathBuf>,
    pub pruned: Vec<PathBuf>,
    /// Non-move failures (directories, scaffolds) as `path: message`.
    pub warnings: Vec<String>,
    /// Files the plan kept out of the run: collisions, merges, unclassified.
    pub skipped: usize,
}

impl ApplyReport {
    #[must_use]
    pub fn moved(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_moved()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &MoveOutcome> {
        self.outcomes.iter().filter(|o| !o.is_moved())
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.moved()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// `Ok` when every move succeeded, `PartialApply` otherwise.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TmigError::PartialApply {
                failed: self.failed(),
                total: self.outcomes.len(),
            })
        }
    }
}

/// Applies plans below one project root.
pub struct Executor<'a> {
    project_root: &'a Path,
    tests_dir: PathBuf,
    options: ApplyOptions,
}

impl<'a> Executor<'a> {
    #[must_use]
    pub fn new(project_root: &'a Path, tests_dir: impl Into<PathBuf>, options: ApplyOptions) -> Self {
        Self {
            project_root,
            tests_dir: tests_dir.into(),
            options,
        }
    }

    pub fn execute(&self, plan: &MigrationPlan) -> ApplyReport {
        let mut report = ApplyReport {
            skipped: plan.collisions.iter().map(|c| c.sources.len()).sum::<usize>()
                + plan.held.len()
                + plan.unclassified.len(),
            ..ApplyReport::default()
        };

        for dir in &plan.directories {
            let abs = self.project_root.join(dir);
            if abs.is_dir() {
                continue;
            }
            match fs::create_dir_all(&abs) {
                Ok(()) => report.directories_created.push(dir.clone()),
                Err(err) => {
                    tracing::warn!(dir = %dir.display(), error = %err, "could not create directory");
                    report.warnings.push(format!("{}: {err}", dir.display()));
                }
            }
        }

        for planned in &plan.moves {
            let status = match self.move_file(planned) {
                Ok(()) => {
                    tracing::info!(
                        source = %planned.source.display(),
                        destination = %planned.destination.display(),
                        "moved"
                    );
                    MoveStatus::Moved
                }
                Err(err) => {
                    tracing::warn!(
                        source = %planned.source.display(),
                        error = %err,
                        "move failed"
                    );
                    MoveStatus::Failed {
                        code: err.code(),
                        message: err.to_string(),
                    }
                }
            };
            report.outcomes.push(MoveOutcome {
                source: planned.source.clone(),
                destination: planned.destination.clone(),
                status,
            });
        }

        for scaffold in &plan.scaffolds {
            match self.write_scaffold(scaffold) {
                Ok(true) => report.scaffolded.push(scaffold.clone()),
                Ok(false) => {}
                Err(err) => report.warnings.push(format!("{}: {err}", scaffold.display())),
            }
        }

        if self.options.prune_empty_dirs {
            report.pruned = self.prune(&report.outcomes);
        }

        tracing::info!(
            moved = report.moved(),
            failed = report.failed(),
            skipped = report.skipped,
            "apply finished"
        );
        report
    }

    fn move_file(&self, planned: &PlannedMove) -> Result<()> {
        let source = self.project_root.join(&planned.source);
        let destination = self.project_root.join(&planned.destination);

        if fs::symlink_metadata(&destination).is_ok() {
            return Err(TmigError::DestinationCollision {
                destination: planned.destination.clone(),
                sources: vec![planned.source.clone()],
            });
        }
        let before = if self.options.verify_content {
            Some(file_digest(&source).map_err(|err| match err {
                TmigError::Io(io_err) => TmigError::from_io(io_err, &planned.source),
                other => other,
            })?)
        } else {
            fs::symlink_metadata(&source).map_err(|err| TmigError::from_io(err, &planned.source))?;
            None
        };

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|err| move_failed(planned, &err))?;
        }
        rename_or_copy(&source, &destination).map_err(|err| match err.kind() {
            io::ErrorKind::PermissionDenied => TmigError::PermissionDenied(planned.source.clone()),
            _ => move_failed(planned, &err),
        })?;

        if let Some(before) = before {
            let after = file_digest(&destination)?;
            if before != after {
                return Err(TmigError::ContentMismatch(planned.destination.clone()));
            }
        }
        Ok(())
    }

    /// Returns whether a stub was written; an existing conftest is left alone.
    fn write_scaffold(&self, relative: &Path) -> io::Result<bool> {
        let path = self.project_root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(CONFTEST_STUB.as_bytes())?;
                tracing::info!(path = %relative.display(), "scaffolded conftest");
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Remove emptied source directories bottom-up, stopping at the tests dir.
    fn prune(&self, outcomes: &[MoveOutcome]) -> Vec<PathBuf> {
        let mut candidates: Vec<&Path> = outcomes
            .iter()
            .filter(|o| o.is_moved())
            .filter_map(|o| o.source.parent())
            .collect();
        // Deepest first so parents are checked after their children.
        candidates.sort_by(|a, b| {
            b.components()
                .count()
                .cmp(&a.components().count())
                .then_with(|| a.cmp(b))
        });
        candidates.dedup();

        let mut pruned = Vec::new();
        for start in candidates {
            let mut dir = Some(start);
            while let Some(current) = dir {
                if current == self.tests_dir
                    || !current.starts_with(&self.tests_dir)
                    || pruned.iter().any(|p: &PathBuf| p == current)
                {
                    break;
                }
                let abs = self.project_root.join(current);
                let is_empty = fs::read_dir(&abs).is_ok_and(|mut entries| entries.next().is_none());
                if !is_empty || fs::remove_dir(&abs).is_err() {
                    break;
                }
                tracing::debug!(dir = %current.display(), "pruned empty directory");
                pruned.push(current.to_path_buf());
                dir = current.parent();
            }
        }
        pruned
    }
}

fn move_failed(planned: &PlannedMove, err: &io::Error) -> TmigError {
    TmigError::MoveFailed {
        source_path: planned.source.clone(),
        destination: planned.destination.clone(),
        reason: err.to_string(),
    }
}

/// `rename`, falling back to copy and remove when crossing filesystems.
fn rename_or_copy(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Err(err) if err.raw_os_error() == Some(libc::EXDEV) => {
            tracing::debug!(source = %source.display(), "cross-device move, copying");
            fs::copy(source, destination)?;
            fs::remove_file(source)
        }
        other => other,
    }
}

/// Hex SHA-256 of a file's content.
pub fn file_digest(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
