//! Output file names, column layouts and row types.
//!
//! Every file carries all of its columns on every row. Undefined values are
//! written as an empty field.

use serde::{Deserialize, Serialize};

use treegrowth_analyze::{Metric, SourceFolderCell};
use treegrowth_core::{Node, NodeId, format_timestamp};

/// Version of every file layout in this module.
pub const SCHEMA_VERSION: u32 = 1;

/// Name of the per-application manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Columns of `tree_<release>.csv`.
pub const TREE_COLUMNS: &[&str] = &[
    "id",
    "parent",
    "name",
    "extension",
    "size_bytes",
    "folder",
    "num_files",
    "num_files_direct",
    "level",
    "mtime",
];

/// Columns of `files-per-level_<application>.csv`.
pub const LEVEL_COLUMNS: &[&str] = &["release", "level", "num_files", "num_folders"];

/// Leading columns of `stats_<application>.csv`.
pub const STATS_KEY_COLUMNS: &[&str] = &["release", "mtime"];

/// Leading columns of `source-folders_<application>.csv`.
pub const MATRIX_KEY_COLUMNS: &[&str] = &["id", "level"];

pub fn tree_file(release: &str) -> String {
    format!("tree_{release}.csv")
}

pub fn stats_file(application: &str) -> String {
    format!("stats_{application}.csv")
}

pub fn levels_file(application: &str) -> String {
    format!("files-per-level_{application}.csv")
}

pub fn matrix_file(application: &str) -> String {
    format!("source-folders_{application}.csv")
}

/// Full header of the stats file: keys, metrics, then absolute and percent
/// growth per metric.
pub fn stats_columns() -> Vec<String> {
    STATS_KEY_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(Metric::all().map(|m| m.name().to_string()))
        .chain(Metric::all().flat_map(|m| [m.growth_column(), m.growth_pct_column()]))
        .collect()
}

/// One row of a tree file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeRow {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub name: String,
    pub extension: String,
    pub size_bytes: u64,
    pub folder: bool,
    /// Files in the subtree; empty for files.
    pub num_files: Option<u64>,
    /// Files among direct children; empty for files.
    pub num_files_direct: Option<u64>,
    pub level: u32,
    /// RFC 3339, UTC.
    pub mtime: String,
}

impl TreeRow {
    pub fn from_node(node: &Node) -> Self {
        Self {
            id: node.id,
            parent: node.parent,
            name: node.name.to_string(),
            extension: node.extension().to_string(),
            size_bytes: node.size,
            folder: node.is_folder(),
            num_files: node.num_files_total(),
            num_files_direct: node.num_files_direct(),
            level: node.level,
            mtime: format_timestamp(node.modified),
        }
    }

    /// The row as a matrix cell, if it is a source folder.
    pub fn source_folder(&self) -> Option<SourceFolderCell> {
        match self.num_files_direct {
            Some(n) if self.folder && n > 0 => Some(SourceFolderCell {
                id: self.id,
                level: self.level,
                num_files_direct: n,
            }),
            _ => None,
        }
    }
}
