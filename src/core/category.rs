//! Target categories for classified test files.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TmigError;

/// Where a file belongs in the reorganized suite.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Isolated test with mocked external dependencies
    Unit,
    /// Exercises real internal services without a full UI
    Integration,
    /// Drives a browser or a complete external surface
    E2e,
    /// Page objects and shared utilities
    Helper,
    /// Reusable test data, conftest setup/teardown
    Fixture,
    /// Generated reports
    Report,
    /// No rule matched; needs manual review
    Unclassified,
}

impl Category {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Integration => "integration",
            Self::E2e => "e2e",
            Self::Helper => "helper",
            Self::Fixture => "fixture",
            Self::Report => "report",
            Self::Unclassified => "unclassified",
        }
    }

    #[must_use]
    pub const fn all() -> [Self; 7] {
        [
            Self::Unit,
            Self::Integration,
            Self::E2e,
            Self::Helper,
            Self::Fixture,
            Self::Report,
            Self::Unclassified,
        ]
    }

    /// Test-type categories that get their own top-level directory and conftest.
    #[must_use]
    pub const fn is_test_type(&self) -> bool {
        matches!(self, Self::Unit | Self::Integration | Self::E2e)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TmigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TmigError::Config(format!("unknown category: {s}")))
    }
}

/// A scanned file and the result of classifying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFile {
    /// Path relative to the project root.
    pub path: PathBuf,
    pub category: Category,
    /// Destination relative to the project root; `None` when unclassified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    /// Name of the rule that matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl TestFile {
    #[must_use]
    pub fn unclassified(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            category: Category::Unclassified,
            destination: None,
            rule: None,
        }
    }

    #[must_use]
    pub const fn is_classified(&self) -> bool {
        self.destination.is_some()
    }

    /// Already at its destination.
    #[must_use]
    pub fn is_in_place(&self) -> bool {
        self.destination.as_ref() == Some(&self.path)
    }
}
