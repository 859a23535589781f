//! Release tree walking for treegrowth.
//!
//! This crate turns a release directory into a filtered [`NodeTable`]:
//!
//! - **Walk** the release root with jwalk ([`JwalkScanner`])
//! - **Normalize** walker indices into stable, path-derived ids
//!   ([`IdentityNormalizer`])
//! - **Filter** non-source files and folders without source files
//!   ([`SourceFilter`])
//!
//! # Example
//!
//! ```rust,no_run
//! use treegrowth_scan::{IdentityNormalizer, JwalkScanner, ScanConfig, SourceFilter};
//!
//! let config = ScanConfig::new("input/demo/1.0");
//! let walked = JwalkScanner::new().scan(&config).unwrap();
//! let normalized = IdentityNormalizer::new().normalize(walked);
//! let filter = SourceFilter::new(config.name_filter().unwrap());
//! let table = filter.apply(normalized.table).unwrap();
//!
//! println!("{} source files", table.file_count());
//! ```

mod filter;
mod identity;
mod scanner;

pub use filter::SourceFilter;
pub use identity::{Blake3PathHasher, IdentityNormalizer, NormalizedTree, PathHasher};
pub use scanner::{JwalkScanner, WalkEntry, WalkStats, WalkedTree};

// Re-export core types for convenience
pub use treegrowth_core::{
    NameFilter, Node, NodeId, NodeKind, NodeTable, ScanConfig, ScanError, ScanWarning,
    WarningKind,
};

/// Walk, normalize and filter one release root.
pub fn scan_release(config: &ScanConfig) -> Result<NormalizedTree, ScanError> {
    let walked = JwalkScanner::new().scan(config)?;
    let NormalizedTree {
        root_path,
        table,
        warnings,
    } = IdentityNormalizer::new().normalize(walked);
    let names = config.name_filter().map_err(|e| ScanError::InvalidConfig {
        message: e.to_string(),
    })?;
    let table = SourceFilter::new(names).apply(table)?;
    Ok(NormalizedTree {
        root_path,
        table,
        warnings,
    })
}
