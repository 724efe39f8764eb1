//! Error handling for tmig.
//!
//! This module provides:
//! - [`TmigError`]: The main error enum for all tmig operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Rich error type with suggestions and context

mod codes;
mod suggestions;

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;
pub use suggestions::suggest_for_error;

/// Main error type for tmig operations.
#[derive(Error, Debug)]
pub enum TmigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Scan error: {0}")]
    Scan(String),

    #[error("Unclassified file: {}", .0.display())]
    UnclassifiedFile(PathBuf),

    #[error("Invalid rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("Rules file not found: {}", .0.display())]
    RulesNotFound(PathBuf),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Destination collision at {}: {}", .destination.display(), format_paths(.sources))]
    DestinationCollision {
        destination: PathBuf,
        sources: Vec<PathBuf>,
    },

    #[error("Directories merge into {}: {}", .destination.display(), format_paths(.sources))]
    DirectoryMerge {
        destination: PathBuf,
        sources: Vec<PathBuf>,
    },

    #[error("Move {} -> {} failed: {reason}", .source_path.display(), .destination.display())]
    MoveFailed {
        source_path: PathBuf,
        destination: PathBuf,
        reason: String,
    },

    #[error("Content mismatch after moving to {}", .0.display())]
    ContentMismatch(PathBuf),

    #[error("Apply incomplete: {failed} of {total} moves failed")]
    PartialApply { failed: usize, total: usize },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl TmigError {
    /// Map an IO error on `path` to the most specific variant.
    #[must_use]
    pub fn from_io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::PathNotFound(path.into()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.into()),
            _ => Self::Io(err),
        }
    }

    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io(_) => ErrorCode::IoError,
            Self::PathNotFound(_) => ErrorCode::PathNotFound,
            Self::PermissionDenied(_) => ErrorCode::PermissionDenied,
            Self::NotADirectory(_) => ErrorCode::NotADirectory,
            Self::Scan(_) => ErrorCode::ScanFailed,
            Self::UnclassifiedFile(_) => ErrorCode::UnclassifiedFile,
            Self::InvalidRule { .. } => ErrorCode::InvalidRule,
            Self::RulesNotFound(_) => ErrorCode::RulesNotFound,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::DestinationCollision { .. } => ErrorCode::DestinationCollision,
            Self::DirectoryMerge { .. } => ErrorCode::DirectoryMerge,
            Self::MoveFailed { .. } => ErrorCode::MoveFailed,
            Self::ContentMismatch(_) => ErrorCode::ContentMismatch,
            Self::PartialApply { .. } => ErrorCode::PartialApply,
            Self::Json(_) | Self::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::PartialApply { .. } => 2,
            _ => 1,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::PathNotFound(path)
            | Self::PermissionDenied(path)
            | Self::NotADirectory(path)
            | Self::UnclassifiedFile(path)
            | Self::RulesNotFound(path) => Some(serde_json::json!({ "path": path })),
            Self::InvalidRule { rule, reason } => {
                Some(serde_json::json!({ "rule": rule, "reason": reason }))
            }
            Self::DestinationCollision {
                destination,
                sources,
            }
            | Self::DirectoryMerge {
                destination,
                sources,
            } => Some(serde_json::json!({ "destination": destination, "sources": sources })),
            Self::MoveFailed {
                source_path,
                destination,
                reason,
            } => Some(serde_json::json!({
                "source": source_path,
                "destination": destination,
                "reason": reason,
            })),
            Self::PartialApply { failed, total } => {
                Some(serde_json::json!({ "failed": failed, "total": total }))
            }
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_tmig_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "PATH_NOT_FOUND")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 101)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    /// Additional context for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Whether this error is potentially recoverable by the user
    pub recoverable: bool,

    /// Error category (e.g., "path", "plan", "apply")
    pub category: String,
}

impl StructuredError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn from_tmig_error(err: &TmigError) -> Self {
        let code = err.code();
        let context = err.context();
        let suggestion = suggest_for_error(code, context.as_ref());

        Self {
            code,
            numeric_code: code.numeric(),
            message: err.to_string(),
            suggestion,
            context,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
        }
    }

    /// Add context to this error.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self.suggestion = suggest_for_error(self.code, self.context.as_ref());
        self
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<&TmigError> for StructuredError {
    fn from(err: &TmigError) -> Self {
        Self::from_tmig_error(err)
    }
}

/// Result type alias using TmigError.
pub type Result<T> = std::result::Result<T, TmigError>;
