//! Per-application manifest.

use serde::{Deserialize, Serialize};

use treegrowth_analyze::ReleaseOrder;

use crate::schema::SCHEMA_VERSION;

/// A release that was left out of the application's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRelease {
    pub release: String,
    /// Pipeline stage that failed.
    pub stage: String,
    pub reason: String,
    /// Warnings raised before the release failed, as display strings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Index of the files written for one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: u32,
    pub application: String,
    /// Policy the releases were ordered by.
    pub order: ReleaseOrder,
    /// File names relative to the application directory.
    pub files: Vec<String>,
    /// Processed releases, in release order.
    pub releases: Vec<String>,
    pub skipped: Vec<SkippedRelease>,
    /// Integrity warnings, as display strings.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Manifest {
    pub fn new(application: impl Into<String>, order: ReleaseOrder) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            application: application.into(),
            order,
            files: Vec::new(),
            releases: Vec::new(),
            skipped: Vec::new(),
            warnings: Vec::new(),
        }
    }
}
