//! Source-folder presence across releases.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use treegrowth_core::{NodeId, NodeTable};

/// One source folder of one release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFolderCell {
    /// Folder id.
    pub id: NodeId,
    /// Folder level.
    pub level: u32,
    /// Files directly inside the folder.
    pub num_files_direct: u64,
}

/// Source folders of an annotated table, in table order.
pub fn source_folders(table: &NodeTable) -> Vec<SourceFolderCell> {
    table
        .folders()
        .filter_map(|f| match f.num_files_direct() {
            Some(n) if n > 0 => Some(SourceFolderCell {
                id: f.id,
                level: f.level,
                num_files_direct: n,
            }),
            _ => None,
        })
        .collect()
}

/// One `(id, level)` row of the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub id: NodeId,
    pub level: u32,
    /// Direct file count per release, `None` where the folder is absent.
    pub cells: Vec<Option<u64>>,
}

/// Outer join of source folders over releases, keyed by `(id, level)`.
///
/// Rows keep first-seen order; columns follow the order releases were
/// added.
#[derive(Debug, Clone, Default)]
pub struct SourceFolderMatrix {
    releases: Vec<String>,
    rows: IndexMap<(NodeId, u32), Vec<Option<u64>>>,
}

impl SourceFolderMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one release column.
    ///
    /// A release name that is already present replaces its column.
    pub fn add_release(
        &mut self,
        release: impl Into<String>,
        cells: impl IntoIterator<Item = SourceFolderCell>,
    ) {
        let release = release.into();
        let column = match self.releases.iter().position(|r| *r == release) {
            Some(column) => {
                for values in self.rows.values_mut() {
                    values[column] = None;
                }
                column
            }
            None => {
                self.releases.push(release);
                for values in self.rows.values_mut() {
                    values.push(None);
                }
                self.releases.len() - 1
            }
        };

        let width = self.releases.len();
        for cell in cells {
            let values = self
                .rows
                .entry((cell.id, cell.level))
                .or_insert_with(|| vec![None; width]);
            values[column] = Some(cell.num_files_direct);
        }
    }

    /// Release names in column order.
    pub fn releases(&self) -> &[String] {
        &self.releases
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in first-seen order.
    pub fn rows(&self) -> impl Iterator<Item = MatrixRow> + '_ {
        self.rows.iter().map(|(&(id, level), cells)| MatrixRow {
            id,
            level,
            cells: cells.clone(),
        })
    }

    /// Row of one folder.
    pub fn get(&self, id: NodeId, level: u32) -> Option<&[Option<u64>]> {
        self.rows.get(&(id, level)).map(Vec::as_slice)
    }
}
