//! Error types for mobile-pkg-renamer
//!
//! This module provides the error taxonomy used throughout the pipeline:
//! - External tool failures (missing binary, non-zero exit, timeout)
//! - Archive errors (corrupt container, missing entry)
//! - Parse errors (malformed property list, unusable tool output)
//! - Filesystem errors raised while renaming
//!
//! None of these escape a single-file pipeline. Per-file stages fold them
//! into zero-confidence candidates or failed outcomes.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for mobile-pkg-renamer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mobile-pkg-renamer
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "icon_dir")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// External tool execution failed (aapt, plutil)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// An operation exceeded its time budget
    #[error("{operation} timed out after {limit:?}")]
    Timeout {
        /// Name of the operation that timed out (e.g., "aapt dump badging")
        operation: String,
        /// The configured ceiling
        limit: Duration,
    },

    /// Archive could not be read or lacks an expected entry
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Malformed property list or unusable tool output
    #[error("failed to parse {what}: {reason}")]
    Parse {
        /// What was being parsed (e.g., "Info.plist")
        what: String,
        /// Why parsing failed
        reason: String,
    },

    /// Physical rename failed
    #[error("rename error: {0}")]
    Rename(#[from] RenameError),

    /// Operation not supported (missing binary, unknown package kind)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Archive-related errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The container is not a readable zip archive
    #[error("failed to read archive {archive}: {reason}")]
    Unreadable {
        /// The package file that could not be opened
        archive: PathBuf,
        /// The underlying reason
        reason: String,
    },

    /// An expected entry is missing from the archive
    #[error("entry {entry} not found in {archive}")]
    MissingEntry {
        /// The package file that was searched
        archive: PathBuf,
        /// The entry path that was expected
        entry: String,
    },

    /// No metadata bundle (Info.plist) exists in the archive
    #[error("no Info.plist found in {archive}")]
    NoManifest {
        /// The package file that was searched
        archive: PathBuf,
    },

    /// An entry exists but could not be read
    #[error("failed to read entry {entry} from {archive}: {reason}")]
    EntryRead {
        /// The package file
        archive: PathBuf,
        /// The entry path
        entry: String,
        /// The underlying reason
        reason: String,
    },
}

/// Filesystem errors raised by the renamer
#[derive(Debug, Error)]
pub enum RenameError {
    /// Rename failed after all retry attempts
    #[error("failed to rename {source_path} to {dest_path} after {attempts} attempt(s): {reason}")]
    Exhausted {
        /// The original path
        source_path: PathBuf,
        /// The intended destination
        dest_path: PathBuf,
        /// Number of attempts made
        attempts: u32,
        /// The last error seen
        reason: String,
    },

    /// Path has no usable file name or parent directory
    #[error("invalid path {path}: {reason}")]
    InvalidPath {
        /// The invalid path that was encountered
        path: PathBuf,
        /// The reason the path is invalid
        reason: String,
    },
}

impl Error {
    /// Build a parse error for `what`
    pub fn parse(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Parse {
            what: what.into(),
            reason: reason.into(),
        }
    }

    /// Machine-readable error code, used in batch reports
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::ExternalTool(_) => "external_tool_error",
            Error::Timeout { .. } => "timeout",
            Error::Archive(e) => match e {
                ArchiveError::Unreadable { .. } => "archive_unreadable",
                ArchiveError::MissingEntry { .. } => "missing_entry",
                ArchiveError::NoManifest { .. } => "no_manifest",
                ArchiveError::EntryRead { .. } => "entry_read_failed",
            },
            Error::Parse { .. } => "parse_error",
            Error::Rename(e) => match e {
                RenameError::Exhausted { .. } => "rename_failed",
                RenameError::InvalidPath { .. } => "invalid_path",
            },
            Error::NotSupported(_) => "not_supported",
            Error::Serialization(_) => "serialization_error",
            Error::Other(_) => "internal_error",
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_operation_and_ceiling() {
        let err = Error::Timeout {
            operation: "aapt dump badging".to_string(),
            limit: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "aapt dump badging timed out after 30s");
        assert_eq!(err.error_code(), "timeout");
    }

    #[test]
    fn sub_second_timeout_keeps_its_unit() {
        let err = Error::Timeout {
            operation: "plutil -p".to_string(),
            limit: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "plutil -p timed out after 250ms");
    }

    #[test]
    fn archive_errors_convert_and_keep_their_code() {
        let err: Error = ArchiveError::NoManifest {
            archive: PathBuf::from("game.ipa"),
        }
        .into();
        assert!(err.to_string().contains("no Info.plist found in game.ipa"));
        assert_eq!(err.error_code(), "no_manifest");
    }

    #[test]
    fn rename_exhausted_reports_attempts() {
        let err: Error = RenameError::Exhausted {
            source_path: PathBuf::from("a.apk"),
            dest_path: PathBuf::from("b.apk"),
            attempts: 4,
            reason: "permission denied".to_string(),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.contains("after 4 attempt(s)"), "got: {msg}");
        assert_eq!(err.error_code(), "rename_failed");
    }

    #[test]
    fn io_errors_convert_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.error_code(), "io_error");
    }

    #[test]
    fn parse_helper_builds_parse_variant() {
        let err = Error::parse("Info.plist", "unexpected EOF");
        assert_eq!(err.to_string(), "failed to parse Info.plist: unexpected EOF");
    }
}
