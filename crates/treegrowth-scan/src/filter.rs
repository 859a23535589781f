//! Source filter: keeps admitted files and the folders that lead to them.

use std::collections::HashMap;

use tracing::debug;

use treegrowth_core::{NameFilter, NodeId, NodeKind, NodeTable, ScanError};

/// Prunes non-source files and folders without source files.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    names: NameFilter,
}

impl SourceFilter {
    /// Create a filter from compiled name rules.
    pub fn new(names: NameFilter) -> Self {
        Self { names }
    }

    /// Filter a node table.
    ///
    /// Files are pruned first (extension, excluded or hidden ancestor
    /// segment); folder file counts and sizes are then computed over the
    /// surviving files in one bottom-up pass and empty folders are removed.
    /// Returns [`ScanError::NoSourceFiles`] if no file survives.
    pub fn apply(&self, table: NodeTable) -> Result<NodeTable, ScanError> {
        let before = table.len();

        // File-level pass.
        let mut nodes: Vec<_> = table
            .into_nodes()
            .into_iter()
            .filter(|node| {
                if self.names.excludes_path(&node.path) {
                    return false;
                }
                match &node.kind {
                    NodeKind::File { extension } => self.names.allows_extension(extension),
                    NodeKind::Folder { .. } => true,
                }
            })
            .collect();

        // Subtree pass, deepest nodes first.
        let mut order: Vec<usize> = (0..nodes.len()).collect();
        order.sort_by(|&a, &b| nodes[b].level.cmp(&nodes[a].level));

        let mut totals: HashMap<NodeId, (u64, u64)> = HashMap::new();
        for pos in order {
            let node = &mut nodes[pos];
            let (files, bytes) = match node.kind {
                NodeKind::File { .. } => (1, node.size),
                NodeKind::Folder {
                    ref mut num_files_total,
                    ..
                } => {
                    let (files, bytes) = totals.get(&node.id).copied().unwrap_or((0, 0));
                    *num_files_total = files;
                    node.size = bytes;
                    (files, bytes)
                }
            };
            if let Some(parent) = node.parent {
                let acc = totals.entry(parent).or_insert((0, 0));
                acc.0 += files;
                acc.1 += bytes;
            }
        }

        nodes.retain(|node| node.file_count() > 0);

        let table = NodeTable::from_nodes(nodes);
        if table.file_count() == 0 {
            return Err(ScanError::NoSourceFiles);
        }

        debug!(before, after = table.len(), "source filter applied");
        Ok(table)
    }
}
