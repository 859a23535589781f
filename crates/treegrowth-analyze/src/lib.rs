//! Analysis algorithms for treegrowth.
//!
//! This crate turns filtered release tables into comparable numbers:
//!
//! - **Metrics** - Per-release scalars and per-level counts
//!   ([`MetricsAggregator`])
//! - **Growth** - Absolute and percent change between consecutive releases
//!   ([`GrowthCalculator`])
//! - **Ordering** - Chronological order of an application's releases
//!   ([`ReleaseOrder`])
//! - **Matrix** - Source folders joined across releases
//!   ([`SourceFolderMatrix`])
//!
//! # Growth
//!
//! Summaries are sorted first, then growth is computed pairwise over the
//! sorted slice. The first release has no predecessor, so every one of its
//! growth values is undefined.
//!
//! ```rust,ignore
//! use treegrowth_analyze::{GrowthCalculator, MetricsAggregator, Metric, ReleaseOrder};
//! use treegrowth_scan::{ScanConfig, scan_release};
//!
//! let mut summaries = Vec::new();
//! for release in ["1.0", "2.0"] {
//!     let mut tree = scan_release(&ScanConfig::new(format!("input/demo/{release}"))).unwrap();
//!     let metrics = MetricsAggregator::new().aggregate(release, &mut tree.table).unwrap();
//!     summaries.push(metrics.summary);
//! }
//!
//! ReleaseOrder::Modified.sort(&mut summaries);
//! GrowthCalculator::new().apply(&mut summaries);
//!
//! let growth = summaries[1].growth.as_ref().unwrap().get(Metric::NumFiles);
//! println!("files grew by {:?}%", growth.percent);
//! ```

mod compare;
mod growth;
mod matrix;
mod metrics;
mod ordering;
mod summary;

pub use compare::{FirstLastComparison, compare_first_last};
pub use growth::{
    DELTA_PRECISION, GrowthCalculator, MetricDelta, MetricGrowth, PERCENT_PRECISION,
    ReleaseGrowth, percent_change,
};
pub use matrix::{MatrixRow, SourceFolderCell, SourceFolderMatrix, source_folders};
pub use metrics::{MetricsAggregator, MetricsError, ReleaseMetrics};
pub use ordering::{Release, ReleaseOrder};
pub use summary::{LevelSummary, Metric, MetricValue, ReleaseSummary, round_to};

// Re-export core types
pub use treegrowth_core::{NodeId, NodeTable};
