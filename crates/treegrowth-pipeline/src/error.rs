//! Pipeline error types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use treegrowth_analyze::MetricsError;
use treegrowth_core::{ConfigError, ScanError, ScanWarning};
use treegrowth_store::StoreError;

/// Errors that stop the whole run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input root cannot be listed.
    #[error("Cannot read input directory {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An application output directory cannot be created.
    #[error("Cannot create output directory for {application}: {source}")]
    Output {
        application: String,
        #[source]
        source: StoreError,
    },

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Step of per-release processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Walk,
    Filter,
    Metrics,
    Store,
}

/// Underlying cause of a [`ReleaseError`].
#[derive(Debug, Error)]
pub enum ReleaseErrorKind {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A release that could not be processed. The release is skipped; the run
/// continues.
#[derive(Debug, Error)]
#[error("{application}/{release} failed at {stage}: {kind}")]
pub struct ReleaseError {
    pub application: String,
    pub release: String,
    pub stage: Stage,
    #[source]
    pub kind: ReleaseErrorKind,
    /// Warnings gathered before the failing stage.
    pub warnings: Vec<ScanWarning>,
}

impl ReleaseError {
    pub fn new(
        application: &str,
        release: &str,
        stage: Stage,
        kind: impl Into<ReleaseErrorKind>,
    ) -> Self {
        Self {
            application: application.to_string(),
            release: release.to_string(),
            stage,
            kind: kind.into(),
            warnings: Vec::new(),
        }
    }

    /// Attach the warnings collected by earlier stages.
    pub fn with_warnings(mut self, warnings: &[ScanWarning]) -> Self {
        self.warnings.extend_from_slice(warnings);
        self
    }
}
