//! Scanning, classification, planning and applying

pub mod apply;
pub mod category;
pub mod classify;
pub mod plan;
pub mod rules;
pub mod scan;

pub use apply::{ApplyOptions, ApplyReport, Executor, MoveOutcome, MoveStatus, file_digest};
pub use category::{Category, TestFile};
pub use classify::{RuleEvaluation, classify, explain};
pub use plan::{Collision, DirectoryMerge, MigrationPlan, PlanOptions, PlannedMove, Planner};
pub use rules::{ClassificationRule, RuleSet, RuleSource, RuleSpec};
pub use scan::{ScanFilter, ScanIter, Scanner};
