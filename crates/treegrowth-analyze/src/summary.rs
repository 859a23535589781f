//! Per-release and per-level summary rows.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::growth::ReleaseGrowth;

/// A numeric column of [`ReleaseSummary`].
///
/// Variants are listed in output column order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    SizeBytes,
    NumFiles,
    AvgFileSizeBytes,
    MaxFileSizeBytes,
    NumFolders,
    NumSourceFolders,
    AvgSourceFolderSizeNumFiles,
    AvgSourceFolderSizeBytes,
    MaxSourceFolderSizeNumFiles,
    MaxSourceFolderSizeBytes,
    MaxTreeLevel,
    AvgTreeLevel,
    MaxNumFilesLevel,
    AvgNumFilesLevel,
    TreeSize,
}

impl Metric {
    /// Column name.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Whether the metric is an integral count.
    pub fn is_count(&self) -> bool {
        matches!(
            self,
            Metric::SizeBytes
                | Metric::NumFiles
                | Metric::MaxFileSizeBytes
                | Metric::NumFolders
                | Metric::NumSourceFolders
                | Metric::MaxSourceFolderSizeNumFiles
                | Metric::MaxSourceFolderSizeBytes
                | Metric::MaxTreeLevel
                | Metric::MaxNumFilesLevel
        )
    }

    /// Name of the absolute growth column.
    pub fn growth_column(&self) -> String {
        format!("growth_{self}")
    }

    /// Name of the percent growth column.
    pub fn growth_pct_column(&self) -> String {
        format!("growth_{self}_pct")
    }

    /// All metrics in column order.
    pub fn all() -> impl Iterator<Item = Metric> {
        Metric::iter()
    }
}

/// Value of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Integral count.
    Count(u64),
    /// Ratio with fixed precision.
    Ratio(f64),
    /// Not computable for this release.
    Undefined,
}

impl MetricValue {
    /// Numeric value, `None` when undefined.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Count(v) => Some(*v as f64),
            MetricValue::Ratio(v) => Some(*v),
            MetricValue::Undefined => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(v) => write!(f, "{v}"),
            MetricValue::Ratio(v) => write!(f, "{v}"),
            MetricValue::Undefined => Ok(()),
        }
    }
}

/// Round to a number of decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Aggregated metrics of one release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseSummary {
    /// Release name (directory name).
    pub release: String,
    /// Modification time of the release root.
    pub modified: SystemTime,
    /// Sum of file sizes.
    pub size_bytes: u64,
    /// Number of files.
    pub num_files: u64,
    /// Mean file size.
    pub avg_file_size_bytes: f64,
    /// Largest file size.
    pub max_file_size_bytes: u64,
    /// Number of folders, the root included.
    pub num_folders: u64,
    /// Folders with at least one direct file.
    pub num_source_folders: u64,
    /// Mean direct files per source folder.
    pub avg_source_folder_size_num_files: f64,
    /// Mean direct bytes per source folder.
    pub avg_source_folder_size_bytes: f64,
    /// Most direct files in one source folder.
    pub max_source_folder_size_num_files: u64,
    /// Most direct bytes in one source folder.
    pub max_source_folder_size_bytes: u64,
    /// Deepest level of any node.
    pub max_tree_level: u64,
    /// Mean level of leaf folders.
    pub avg_tree_level: f64,
    /// Most files on one level.
    pub max_num_files_level: u64,
    /// Mean files per level, over levels holding files.
    pub avg_num_files_level: f64,
    /// `avg_num_files_level / avg_tree_level`; undefined for a flat tree.
    pub tree_size: Option<f64>,
    /// Deltas against the previous release, set by the growth calculator.
    pub growth: Option<ReleaseGrowth>,
}

impl ReleaseSummary {
    /// Value of one metric.
    pub fn value(&self, metric: Metric) -> MetricValue {
        use MetricValue::{Count, Ratio};
        match metric {
            Metric::SizeBytes => Count(self.size_bytes),
            Metric::NumFiles => Count(self.num_files),
            Metric::AvgFileSizeBytes => Ratio(self.avg_file_size_bytes),
            Metric::MaxFileSizeBytes => Count(self.max_file_size_bytes),
            Metric::NumFolders => Count(self.num_folders),
            Metric::NumSourceFolders => Count(self.num_source_folders),
            Metric::AvgSourceFolderSizeNumFiles => Ratio(self.avg_source_folder_size_num_files),
            Metric::AvgSourceFolderSizeBytes => Ratio(self.avg_source_folder_size_bytes),
            Metric::MaxSourceFolderSizeNumFiles => Count(self.max_source_folder_size_num_files),
            Metric::MaxSourceFolderSizeBytes => Count(self.max_source_folder_size_bytes),
            Metric::MaxTreeLevel => Count(self.max_tree_level),
            Metric::AvgTreeLevel => Ratio(self.avg_tree_level),
            Metric::MaxNumFilesLevel => Count(self.max_num_files_level),
            Metric::AvgNumFilesLevel => Ratio(self.avg_num_files_level),
            Metric::TreeSize => self.tree_size.map_or(MetricValue::Undefined, Ratio),
        }
    }

    /// All metrics in column order.
    pub fn metrics(&self) -> impl Iterator<Item = (Metric, MetricValue)> + '_ {
        Metric::iter().map(move |m| (m, self.value(m)))
    }

    /// Set one metric from its stored value.
    ///
    /// Counts are truncated from the numeric value; `None` clears the
    /// optional `tree_size` and zeroes the rest.
    pub fn set_value(&mut self, metric: Metric, value: Option<f64>) {
        let ratio = value.unwrap_or(0.0);
        let count = ratio.max(0.0) as u64;
        match metric {
            Metric::SizeBytes => self.size_bytes = count,
            Metric::NumFiles => self.num_files = count,
            Metric::AvgFileSizeBytes => self.avg_file_size_bytes = ratio,
            Metric::MaxFileSizeBytes => self.max_file_size_bytes = count,
            Metric::NumFolders => self.num_folders = count,
            Metric::NumSourceFolders => self.num_source_folders = count,
            Metric::AvgSourceFolderSizeNumFiles => self.avg_source_folder_size_num_files = ratio,
            Metric::AvgSourceFolderSizeBytes => self.avg_source_folder_size_bytes = ratio,
            Metric::MaxSourceFolderSizeNumFiles => self.max_source_folder_size_num_files = count,
            Metric::MaxSourceFolderSizeBytes => self.max_source_folder_size_bytes = count,
            Metric::MaxTreeLevel => self.max_tree_level = count,
            Metric::AvgTreeLevel => self.avg_tree_level = ratio,
            Metric::MaxNumFilesLevel => self.max_num_files_level = count,
            Metric::AvgNumFilesLevel => self.avg_num_files_level = ratio,
            Metric::TreeSize => self.tree_size = value,
        }
    }

    /// An all-zero summary, used when rebuilding rows from storage.
    pub fn empty(release: impl Into<String>, modified: SystemTime) -> Self {
        Self {
            release: release.into(),
            modified,
            size_bytes: 0,
            num_files: 0,
            avg_file_size_bytes: 0.0,
            max_file_size_bytes: 0,
            num_folders: 0,
            num_source_folders: 0,
            avg_source_folder_size_num_files: 0.0,
            avg_source_folder_size_bytes: 0.0,
            max_source_folder_size_num_files: 0,
            max_source_folder_size_bytes: 0,
            max_tree_level: 0,
            avg_tree_level: 0.0,
            max_num_files_level: 0,
            avg_num_files_level: 0.0,
            tree_size: None,
            growth: None,
        }
    }
}

/// File and folder counts on one level of one release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    /// Release name.
    pub release: String,
    /// Depth from the release root.
    pub level: u32,
    /// Files on this level.
    pub num_files: u64,
    /// Folders on this level.
    pub num_folders: u64,
}
