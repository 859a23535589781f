//! Store error type.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while writing or reading output files.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A file or directory could not be created, read or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding or decoding failed.
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Manifest encoding or decoding failed.
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A required column is absent from a file header.
    #[error("Missing column {column:?} in {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// A field could not be parsed.
    #[error("Invalid value {value:?} for {column:?} in {path}, record {record}")]
    InvalidValue {
        path: PathBuf,
        record: usize,
        column: String,
        value: String,
    },

    /// The file was written by an incompatible schema version.
    #[error("Unsupported schema version {found} in {path} (expected {expected})")]
    SchemaVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
