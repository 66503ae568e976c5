//! Error types for repogov.
//!
//! Library crates use [`RepoGovError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` and prints a single-line diagnostic.

use std::path::PathBuf;

/// Top-level error type for all repogov operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoGovError {
    /// A record, field, section, or file the caller asked for does not exist.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// Required fields are missing from a record before a state transition.
    #[error("validation failed for {subject}: missing {}", .missing.join(", "))]
    ValidationFailed {
        subject: String,
        missing: Vec<String>,
    },

    /// Invalid caller input (bad date, forbidden characters, malformed identifier, ...).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Network, auth, or HTTP status error talking to the pull request service.
    #[error("remote error: {0}")]
    Remote(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A document is structurally unusable.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The exclusive repository lock could not be acquired.
    #[error("lock error at {path:?}: {message}")]
    Lock { path: PathBuf, message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, RepoGovError>;

impl RepoGovError {
    /// Create a not-found error describing what was missing.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a validation failure listing every missing field.
    pub fn missing_fields(subject: impl Into<String>, missing: Vec<String>) -> Self {
        Self::ValidationFailed {
            subject: subject.into(),
            missing,
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error only says that something is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = RepoGovError::not_found("record TASK-071 in BACKLOG.md");
        assert_eq!(err.to_string(), "not found: record TASK-071 in BACKLOG.md");

        let err = RepoGovError::validation("expiration '2025-13-01' is not a date");
        assert!(err.to_string().contains("2025-13-01"));
    }

    #[test]
    fn validation_failure_lists_every_field() {
        let err = RepoGovError::missing_fields(
            "TASK-071",
            vec!["Priority".into(), "Acceptance Criteria".into()],
        );
        assert_eq!(
            err.to_string(),
            "validation failed for TASK-071: missing Priority, Acceptance Criteria"
        );
    }

    #[test]
    fn not_found_is_recognised() {
        assert!(RepoGovError::not_found("x").is_not_found());
        assert!(!RepoGovError::config("x").is_not_found());
    }
}
