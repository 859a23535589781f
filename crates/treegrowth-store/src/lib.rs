//! Output files for treegrowth.
//!
//! Each application gets its own directory under the output root:
//!
//! ```text
//! output/<application>/
//!     tree_<release>.csv
//!     stats_<application>.csv
//!     files-per-level_<application>.csv
//!     source-folders_<application>.csv
//!     manifest.json
//! ```
//!
//! Layouts are described in [`schema`] and versioned by
//! [`SCHEMA_VERSION`].

mod error;
mod manifest;
mod reader;
pub mod schema;
mod store;
mod writer;

pub use error::StoreError;
pub use manifest::{Manifest, SkippedRelease};
pub use schema::{SCHEMA_VERSION, TreeRow};
pub use store::{ReleaseStore, stored_applications};
