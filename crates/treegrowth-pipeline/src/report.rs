//! Run reports.

use std::time::Duration;

use serde::Serialize;

use treegrowth_analyze::{FirstLastComparison, ReleaseOrder, ReleaseSummary, compare_first_last};
use treegrowth_core::ScanWarning;
use treegrowth_store::SkippedRelease;

use crate::error::ReleaseError;

impl From<&ReleaseError> for SkippedRelease {
    fn from(err: &ReleaseError) -> Self {
        SkippedRelease {
            release: err.release.clone(),
            stage: err.stage.to_string(),
            reason: err.kind.to_string(),
            warnings: err.warnings.iter().map(display_warning).collect(),
        }
    }
}

/// Render a warning as a manifest line.
pub(crate) fn display_warning(warning: &ScanWarning) -> String {
    format!("{}: {}", warning.path.display(), warning.message)
}

/// Outcome of one application.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationReport {
    pub application: String,
    pub order: ReleaseOrder,
    /// Summaries with growth, in release order.
    pub releases: Vec<ReleaseSummary>,
    pub skipped: Vec<SkippedRelease>,
    pub warnings: Vec<ScanWarning>,
    /// Files written, relative to the application output directory.
    pub files: Vec<String>,
    /// Set when the application-level files could not be written.
    pub error: Option<String>,
}

impl ApplicationReport {
    pub fn new(application: impl Into<String>, order: ReleaseOrder) -> Self {
        Self {
            application: application.into(),
            order,
            releases: Vec::new(),
            skipped: Vec::new(),
            warnings: Vec::new(),
            files: Vec::new(),
            error: None,
        }
    }

    /// Whether any release was skipped or a file failed to write.
    pub fn has_failures(&self) -> bool {
        !self.skipped.is_empty() || self.error.is_some()
    }

    pub fn first_last(&self) -> Option<FirstLastComparison> {
        compare_first_last(&self.application, &self.releases)
    }
}

/// Outcome of a full run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub applications: Vec<ApplicationReport>,
    pub duration: Duration,
}

impl RunReport {
    /// Releases processed across all applications.
    pub fn processed_count(&self) -> usize {
        self.applications.iter().map(|a| a.releases.len()).sum()
    }

    /// Releases skipped across all applications.
    pub fn skipped_count(&self) -> usize {
        self.applications.iter().map(|a| a.skipped.len()).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.applications.iter().map(|a| a.warnings.len()).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.applications.iter().any(ApplicationReport::has_failures)
    }
}
