//! Error and warning types shared across the pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while walking or filtering a release tree.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The walk stopped before the tree was fully read.
    #[error("Walk of {path} aborted: {message}")]
    WalkAborted { path: PathBuf, message: String },

    /// The release directory contains no entries at all.
    #[error("Release directory is empty: {path}")]
    EmptyRelease { path: PathBuf },

    /// No file survived the extension and exclusion filters.
    #[error("No source files left after filtering (check the extension allow-list)")]
    NoSourceFiles,

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`crate::PipelineConfig`].
    #[error("Cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// An exclude pattern is not a valid glob.
    #[error("Invalid exclude pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Kind of warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error reading file/directory.
    ReadError,
    /// Error reading metadata.
    MetadataError,
    /// Two distinct relative paths hashed to the same id.
    HashCollision,
    /// A folder's file count does not match the sum over its children.
    CountMismatch,
    /// A node references a parent that is not in the table.
    DanglingParent,
}

impl WarningKind {
    /// Whether this warning indicates a data-integrity problem rather than
    /// an unreadable entry.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            WarningKind::HashCollision | WarningKind::CountMismatch | WarningKind::DanglingParent
        )
    }
}

/// Non-fatal warning encountered while processing a release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a read error warning.
    pub fn read_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        let kind = if error.kind() == std::io::ErrorKind::PermissionDenied {
            WarningKind::PermissionDenied
        } else {
            WarningKind::ReadError
        };
        Self {
            message: format!("Read error: {error}"),
            path,
            kind,
        }
    }

    /// Create a warning for an entry whose containing folder was not recorded.
    pub fn missing_parent(path: impl Into<PathBuf>) -> Self {
        Self {
            message: "Containing folder was not read; entry dropped".to_string(),
            path: path.into(),
            kind: WarningKind::ReadError,
        }
    }

    /// Create a warning for an entry whose modification time is unreadable.
    pub fn unknown_mtime(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self {
            message: format!("Modification time unavailable ({error}); using the Unix epoch"),
            path: path.into(),
            kind: WarningKind::MetadataError,
        }
    }

    /// Create a hash collision warning.
    pub fn hash_collision(path: &str, existing: &str, id: impl std::fmt::Display) -> Self {
        Self {
            message: format!("Id {id} of {path:?} collides with {existing:?}; entry dropped"),
            path: PathBuf::from(path),
            kind: WarningKind::HashCollision,
        }
    }

    /// Create a count mismatch warning.
    pub fn count_mismatch(path: &str, recorded: u64, expected: u64) -> Self {
        Self {
            message: format!("Folder records {recorded} files but its children sum to {expected}"),
            path: PathBuf::from(path),
            kind: WarningKind::CountMismatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));

        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_warning_integrity_flag() {
        let warning = ScanWarning::hash_collision("a/b.py", "c/d.py", "00ff");
        assert_eq!(warning.kind, WarningKind::HashCollision);
        assert!(warning.kind.is_integrity());
        assert!(warning.message.contains("collides"));

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let warning = ScanWarning::read_error("/x", &io);
        assert_eq!(warning.kind, WarningKind::PermissionDenied);
        assert!(!warning.kind.is_integrity());
    }

    #[test]
    fn test_walk_warnings() {
        let warning = ScanWarning::missing_parent("src/a.py");
        assert_eq!(warning.kind, WarningKind::ReadError);
        assert!(warning.message.contains("dropped"));

        let io = std::io::Error::new(std::io::ErrorKind::Unsupported, "no mtime");
        let warning = ScanWarning::unknown_mtime("src", &io);
        assert_eq!(warning.kind, WarningKind::MetadataError);
        assert!(warning.message.contains("Unix epoch"));
    }
}
