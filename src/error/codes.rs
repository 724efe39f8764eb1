//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Path errors
//! - 2xx: Classification errors
//! - 3xx: Config errors
//! - 4xx: Plan errors
//! - 5xx: Apply errors
//! - 6xx: IO errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for JSON output.
///
/// Each variant maps to a numeric code (e.g., `PathNotFound` -> E101).
/// Codes are grouped by category for easy identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Path errors (1xx)
    // ========================================
    /// E101: Root or source path does not exist
    PathNotFound,
    /// E102: Path exists but cannot be read or written
    PermissionDenied,
    /// E103: Path exists but is not a directory
    NotADirectory,
    /// E104: Directory walk failed below the root
    ScanFailed,

    // ========================================
    // Classification errors (2xx)
    // ========================================
    /// E201: No rule matched a scanned file
    UnclassifiedFile,
    /// E202: A classification rule failed validation
    InvalidRule,
    /// E203: Rules file not found
    RulesNotFound,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E301: Config file not found
    ConfigNotFound,
    /// E302: Config file has invalid syntax or values
    ConfigInvalid,

    // ========================================
    // Plan errors (4xx)
    // ========================================
    /// E401: Two sources share a destination, or the destination exists
    DestinationCollision,
    /// E402: Differently-named source directories merge into one destination
    DirectoryMerge,

    // ========================================
    // Apply errors (5xx)
    // ========================================
    /// E501: A single move failed
    MoveFailed,
    /// E502: Some moves of an apply run failed
    PartialApply,
    /// E503: Moved content does not hash to the original
    ContentMismatch,

    // ========================================
    // IO errors (6xx)
    // ========================================
    /// E601: IO operation failed
    IoError,
    /// E602: Serialization/deserialization failed
    SerializationError,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E901: Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `PathNotFound` -> 101).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::PathNotFound => 101,
            Self::PermissionDenied => 102,
            Self::NotADirectory => 103,
            Self::ScanFailed => 104,

            Self::UnclassifiedFile => 201,
            Self::InvalidRule => 202,
            Self::RulesNotFound => 203,

            Self::ConfigNotFound => 301,
            Self::ConfigInvalid => 302,

            Self::DestinationCollision => 401,
            Self::DirectoryMerge => 402,

            Self::MoveFailed => 501,
            Self::PartialApply => 502,
            Self::ContentMismatch => 503,

            Self::IoError => 601,
            Self::SerializationError => 602,

            Self::InternalError => 901,
        }
    }

    /// Get the error code as a formatted string (e.g., "E101").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::PathNotFound => "Check the path, or pass the project root with `-C <dir>` and the tests directory with `--tests-dir`",
            Self::PermissionDenied => "Check permissions on the path. The tool needs read access to scan and write access to apply",
            Self::NotADirectory => "Point `-C` at the project root and `--tests-dir` at a directory, not a file",
            Self::ScanFailed => "Part of the tree could not be walked. Re-run with -v to see which entries were skipped",

            Self::UnclassifiedFile => "Add a rule for this path to a rules file (`tmig rules --export rules.toml`), or move it by hand",
            Self::InvalidRule => "Fix the rule's pattern or destination template. Run `tmig rules` to list the known placeholders",
            Self::RulesNotFound => "Check the --rules path, or omit it to use the built-in rules",

            Self::ConfigNotFound => "Check the --config path, or omit it to use the layered config lookup",
            Self::ConfigInvalid => "Check TOML syntax and value types in the config file",

            Self::DestinationCollision => "Rename one of the colliding files or add a more specific rule, then re-run `tmig plan`",
            Self::DirectoryMerge => "Review the merged directories by hand, then re-run with --allow-merge if the merge is intended",

            Self::MoveFailed => "Fix the reported cause and re-run `tmig apply`; files already moved are treated as in place",
            Self::PartialApply => "Review the failed moves listed above and re-run `tmig apply` once they are fixed",
            Self::ContentMismatch => "The destination differs from the source. Compare both files before deleting anything",

            Self::IoError => "File operation failed. Check the path exists and permissions are correct",
            Self::SerializationError => "The data format may be corrupted. Check input data for validity",

            Self::InternalError => "An unexpected error occurred. Please report this issue with full error output",
        }
    }

    /// Check if this error is potentially recoverable by the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InternalError | Self::SerializationError)
    }

    /// Warnings are reported but never abort a run.
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(self, Self::UnclassifiedFile | Self::DirectoryMerge)
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "path",
            2 => "classification",
            3 => "config",
            4 => "plan",
            5 => "apply",
            6 => "io",
            9 => "internal",
            _ => "unknown",
        }
    }

    /// Iterate over all error codes.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::PathNotFound,
            Self::PermissionDenied,
            Self::NotADirectory,
            Self::ScanFailed,
            Self::UnclassifiedFile,
            Self::InvalidRule,
            Self::RulesNotFound,
            Self::ConfigNotFound,
            Self::ConfigInvalid,
            Self::DestinationCollision,
            Self::DirectoryMerge,
            Self::MoveFailed,
            Self::PartialApply,
            Self::ContentMismatch,
            Self::IoError,
            Self::SerializationError,
            Self::InternalError,
        ]
        .into_iter()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}
