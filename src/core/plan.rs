//! Migration planning: turn classified files into an ordered set of moves.
//!
//! The plan only reads the filesystem (to detect destinations that already
//! exist). Anything that could lose data is moved into a review list instead
//! of the move list: colliding destinations, differently-spelled source
//! directories merging into one destination, and unclassified files.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::category::{Category, TestFile};
use crate::core::classify::classify;
use crate::core::rules::{RuleSet, normalized_dir_name, path_segments};
use crate::error::TmigError;

/// Planner switches.
#[derive(Debug, Clone, Copy)]
pub struct PlanOptions {
    /// Move files out of merged directories instead of holding them back.
    pub allow_merge: bool,
    /// Add a `conftest.py` stub to new unit/integration/e2e directories.
    pub scaffold_conftest: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            allow_merge: false,
            scaffold_conftest: true,
        }
    }
}

/// One file move, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: Category,
    pub rule: String,
}

/// Sources that cannot all land on `destination`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub destination: PathBuf,
    pub sources: Vec<PathBuf>,
    /// The destination is already occupied on disk.
    pub existing: bool,
}

impl Collision {
    #[must_use]
    pub fn to_error(&self) -> TmigError {
        TmigError::DestinationCollision {
            destination: self.destination.clone(),
            sources: self.sources.clone(),
        }
    }
}

/// Source directories whose names differ only in spelling (`sprint-6`,
/// `sprint_6`, `Sprint6`) feeding one destination directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryMerge {
    pub destination: PathBuf,
    pub sources: Vec<PathBuf>,
}

impl DirectoryMerge {
    #[must_use]
    pub fn to_error(&self) -> TmigError {
        TmigError::DirectoryMerge {
            destination: self.destination.clone(),
            sources: self.sources.clone(),
        }
    }
}

/// Everything `apply` will do, and everything it will not.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationPlan {
    pub moves: Vec<PlannedMove>,
    /// Destination directories that do not exist yet.
    pub directories: Vec<PathBuf>,
    /// `conftest.py` stubs to write.
    pub scaffolds: Vec<PathBuf>,
    pub collisions: Vec<Collision>,
    pub merges: Vec<DirectoryMerge>,
    /// Files held back because they lie under a merged source directory.
    pub held: Vec<PlannedMove>,
    pub unclassified: Vec<PathBuf>,
    pub in_place: Vec<PathBuf>,
    pub scan_warnings: Vec<String>,
    /// Scanned files per category.
    pub counts: BTreeMap<Category, usize>,
}

impl MigrationPlan {
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.counts.values().sum()
    }

    /// Nothing left to move or scaffold.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.moves.is_empty() && self.scaffolds.is_empty()
    }

    /// Count of review items: collisions, merges, unclassified files.
    #[must_use]
    pub fn review_count(&self) -> usize {
        self.collisions.len() + self.merges.len() + self.unclassified.len()
    }

    /// Review items as errors, in report order.
    #[must_use]
    pub fn review_errors(&self) -> Vec<TmigError> {
        self.collisions
            .iter()
            .map(Collision::to_error)
            .chain(self.merges.iter().map(DirectoryMerge::to_error))
            .chain(
                self.unclassified
                    .iter()
                    .map(|path| TmigError::UnclassifiedFile(path.clone())),
            )
            .collect()
    }
}

/// Builds a [`MigrationPlan`] for one project root.
pub struct Planner<'a> {
    project_root: &'a Path,
    rules: &'a RuleSet,
    options: PlanOptions,
}

impl<'a> Planner<'a> {
    #[must_use]
    pub const fn new(project_root: &'a Path, rules: &'a RuleSet, options: PlanOptions) -> Self {
        Self {
            project_root,
            rules,
            options,
        }
    }

    /// Classify `paths` and plan their moves.
    pub fn plan<I>(&self, paths: I) -> MigrationPlan
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let files = paths
            .into_iter()
            .map(|path| classify(&path, self.rules))
            .collect::<Vec<_>>();
        self.plan_files(files)
    }

    /// Plan moves for already-classified files.
    pub fn plan_files(&self, mut files: Vec<TestFile>) -> MigrationPlan {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);

        let mut plan = MigrationPlan::default();
        let mut by_destination: BTreeMap<PathBuf, Vec<PlannedMove>> = BTreeMap::new();

        for file in files {
            *plan.counts.entry(file.category).or_default() += 1;

            if file.is_in_place() {
                plan.in_place.push(file.path);
                continue;
            }
            let (Some(destination), Some(rule)) = (file.destination, file.rule) else {
                plan.unclassified.push(file.path);
                continue;
            };
            by_destination
                .entry(destination.clone())
                .or_default()
                .push(PlannedMove {
                    source: file.path,
                    destination,
                    category: file.category,
                    rule,
                });
        }

        let mut candidates = Vec::new();
        let mut colliding = Vec::new();
        for (destination, moves) in by_destination {
            let existing = self.project_root.join(&destination).exists();
            if moves.len() > 1 || existing {
                tracing::warn!(
                    destination = %destination.display(),
                    sources = moves.len(),
                    existing,
                    "destination collision"
                );
                plan.collisions.push(Collision {
                    destination,
                    sources: moves.iter().map(|m| m.source.clone()).collect(),
                    existing,
                });
                colliding.extend(moves);
            } else {
                candidates.extend(moves);
            }
        }

        // Colliding files still reveal which directories merge.
        plan.merges = detect_merges(candidates.iter().chain(&colliding));
        let merged_sources: Vec<&Path> = plan
            .merges
            .iter()
            .flat_map(|merge| merge.sources.iter().map(PathBuf::as_path))
            .collect();

        let (held, moves): (Vec<_>, Vec<_>) = candidates.into_iter().partition(|m| {
            !self.options.allow_merge && merged_sources.iter().any(|dir| m.source.starts_with(dir))
        });
        plan.held = held;
        plan.moves = moves;
        plan.moves.sort_by(|a, b| a.source.cmp(&b.source));

        let directories: BTreeSet<PathBuf> = plan
            .moves
            .iter()
            .filter_map(|m| m.destination.parent().map(Path::to_path_buf))
            .filter(|dir| !dir.as_os_str().is_empty() && !self.project_root.join(dir).is_dir())
            .collect();
        plan.directories = directories.into_iter().collect();

        if self.options.scaffold_conftest {
            plan.scaffolds = self.scaffolds(&plan.moves);
        }

        tracing::info!(
            moves = plan.moves.len(),
            collisions = plan.collisions.len(),
            merges = plan.merges.len(),
            unclassified = plan.unclassified.len(),
            in_place = plan.in_place.len(),
            "migration plan ready"
        );
        plan
    }

    /// `<tests_dir>/<category>/conftest.py` for each test-type directory that
    /// receives moves and has no conftest yet.
    fn scaffolds(&self, moves: &[PlannedMove]) -> Vec<PathBuf> {
        let destinations: BTreeSet<&Path> = moves.iter().map(|m| m.destination.as_path()).collect();
        let mut out = BTreeSet::new();
        for m in moves.iter().filter(|m| m.category.is_test_type()) {
            let segments = path_segments(&m.destination);
            if segments.len() < 3 || segments[1] != m.category.as_str() {
                continue;
            }
            let conftest: PathBuf = [segments[0].as_str(), segments[1].as_str(), "conftest.py"]
                .iter()
                .collect();
            if !destinations.contains(conftest.as_path())
                && !self.project_root.join(&conftest).exists()
            {
                out.insert(conftest);
            }
        }
        out.into_iter().collect()
    }
}

/// Find destination directories fed by source directories that normalize to
/// the same name.
///
/// Each move pairs every destination ancestor with the source ancestor that
/// ends in the same trailing path, so `sprint-6/sub/test_a.py` and
/// `sprint_6/test_b.py` both report a source for `.../sprint_6`. Merges nested
/// inside a reported merge are dropped.
fn detect_merges<'m>(moves: impl IntoIterator<Item = &'m PlannedMove>) -> Vec<DirectoryMerge> {
    let mut by_dest_dir: BTreeMap<&Path, BTreeSet<&Path>> = BTreeMap::new();
    for m in moves {
        let mut source = m.source.as_path();
        let mut destination = m.destination.as_path();
        while source.file_name() == destination.file_name() {
            let (Some(src_dir), Some(dest_dir)) = (source.parent(), destination.parent()) else {
                break;
            };
            if src_dir.as_os_str().is_empty() || dest_dir.as_os_str().is_empty() {
                break;
            }
            by_dest_dir.entry(dest_dir).or_default().insert(src_dir);
            source = src_dir;
            destination = dest_dir;
        }
    }

    let mut merges: Vec<DirectoryMerge> = Vec::new();
    for (dest_dir, src_dirs) in by_dest_dir {
        if src_dirs.len() < 2 {
            continue;
        }
        let mut by_key: BTreeMap<String, Vec<&Path>> = BTreeMap::new();
        for src in src_dirs {
            let key = path_segments(src)
                .iter()
                .map(|segment| normalized_dir_name(segment))
                .collect::<Vec<_>>()
                .join("/");
            by_key.entry(key).or_default().push(src);
        }
        for group in by_key.into_values().filter(|group| group.len() > 1) {
            let within_reported = merges.iter().any(|outer| {
                dest_dir.starts_with(&outer.destination)
                    && group
                        .iter()
                        .all(|src| outer.sources.iter().any(|o| src.starts_with(o)))
            });
            if within_reported {
                continue;
            }
            tracing::warn!(
                destination = %dest_dir.display(),
                sources = group.len(),
                "differently-named directories merge into one destination"
            );
            merges.push(DirectoryMerge {
                destination: dest_dir.to_path_buf(),
                sources: group.into_iter().map(Path::to_path_buf).collect(),
            });
        }
    }
    merges
}
