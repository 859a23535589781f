//! Per-node annotation and per-release aggregation.

use std::collections::{BTreeMap, HashMap, HashSet};

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, warn};

use treegrowth_core::{Node, NodeId, NodeKind, NodeTable, ScanWarning};

use crate::summary::{LevelSummary, ReleaseSummary, round_to};

/// Reasons a release cannot be summarized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetricsError {
    /// The table has no file nodes.
    #[error("Release has no source files")]
    NoSourceFiles,

    /// No folder holds a file directly, so source-folder averages are
    /// undefined.
    #[error("Release has no source folders")]
    NoSourceFolders,

    /// The table has no root node.
    #[error("Release table has no root folder")]
    MissingRoot,
}

/// Output of aggregating one release.
#[derive(Debug, Clone)]
pub struct ReleaseMetrics {
    /// Release-wide scalars.
    pub summary: ReleaseSummary,
    /// File and folder counts per level, ascending by level.
    pub levels: Vec<LevelSummary>,
    /// Integrity problems found in the table.
    pub warnings: Vec<ScanWarning>,
}

/// Computes per-node and per-release metrics from a filtered table.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// Create a new aggregator.
    pub fn new() -> Self {
        Self
    }

    /// Annotate folders with their number of direct files.
    pub fn annotate(&self, table: &mut NodeTable) {
        let direct: HashMap<NodeId, u64> = table
            .files()
            .filter_map(|f| f.parent)
            .counts()
            .into_iter()
            .map(|(id, count)| (id, count as u64))
            .collect();

        for node in table.nodes_mut() {
            if let NodeKind::Folder {
                ref mut num_files_direct,
                ..
            } = node.kind
            {
                *num_files_direct = direct.get(&node.id).copied().unwrap_or(0);
            }
        }
    }

    /// Annotate the table, check its integrity and summarize it.
    pub fn aggregate(
        &self,
        release: &str,
        table: &mut NodeTable,
    ) -> Result<ReleaseMetrics, MetricsError> {
        self.annotate(table);

        let warnings = table.check_integrity();
        for warning in &warnings {
            warn!(release, path = %warning.path.display(), "{}", warning.message);
        }

        let (summary, levels) = self.summarize(release, table)?;
        debug!(
            release,
            files = summary.num_files,
            folders = summary.num_folders,
            levels = levels.len(),
            "release aggregated"
        );

        Ok(ReleaseMetrics {
            summary,
            levels,
            warnings,
        })
    }

    /// Reduce an annotated table to its summary rows.
    pub fn summarize(
        &self,
        release: &str,
        table: &NodeTable,
    ) -> Result<(ReleaseSummary, Vec<LevelSummary>), MetricsError> {
        let root = table.root().ok_or(MetricsError::MissingRoot)?;

        let files: Vec<&Node> = table.files().collect();
        if files.is_empty() {
            return Err(MetricsError::NoSourceFiles);
        }
        let folders: Vec<&Node> = table.folders().collect();

        let num_files = files.len() as u64;
        let size_bytes: u64 = files.iter().map(|f| f.size).sum();
        let max_file_size_bytes = files.iter().map(|f| f.size).max().unwrap_or(0);

        // Source folders: folders with direct files.
        let direct_bytes: HashMap<NodeId, u64> = files
            .iter()
            .filter_map(|f| f.parent.map(|p| (p, f.size)))
            .into_grouping_map()
            .sum();
        let source_folders: Vec<(u64, u64)> = folders
            .iter()
            .filter_map(|f| match f.num_files_direct() {
                Some(n) if n > 0 => Some((n, direct_bytes.get(&f.id).copied().unwrap_or(0))),
                _ => None,
            })
            .collect();
        if source_folders.is_empty() {
            return Err(MetricsError::NoSourceFolders);
        }
        let num_source_folders = source_folders.len() as u64;

        // Leaf folders: folders without subfolders.
        let with_subfolders: HashSet<NodeId> = folders.iter().filter_map(|f| f.parent).collect();
        let leaf_levels: Vec<u32> = folders
            .iter()
            .filter(|f| !with_subfolders.contains(&f.id))
            .map(|f| f.level)
            .collect();
        let avg_tree_level = mean(leaf_levels.iter().map(|&l| l as f64)).unwrap_or(0.0);

        let max_tree_level = table.nodes().iter().map(|n| n.level).max().unwrap_or(0);

        let mut per_level: BTreeMap<u32, (u64, u64)> = BTreeMap::new();
        for node in table.nodes() {
            let entry = per_level.entry(node.level).or_default();
            if node.is_file() {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }
        let levels: Vec<LevelSummary> = per_level
            .iter()
            .map(|(&level, &(num_files, num_folders))| LevelSummary {
                release: release.to_string(),
                level,
                num_files,
                num_folders,
            })
            .collect();

        let files_per_level: Vec<u64> = levels
            .iter()
            .map(|l| l.num_files)
            .filter(|&n| n > 0)
            .collect();
        let max_num_files_level = files_per_level.iter().copied().max().unwrap_or(0);
        let avg_num_files_level =
            round_to(mean(files_per_level.iter().map(|&n| n as f64)).unwrap_or(0.0), 2);

        let avg_tree_level = round_to(avg_tree_level, 4);
        let tree_size = (avg_tree_level > 0.0).then(|| round_to(avg_num_files_level / avg_tree_level, 4));

        let summary = ReleaseSummary {
            release: release.to_string(),
            modified: root.modified,
            size_bytes,
            num_files,
            avg_file_size_bytes: round_to(size_bytes as f64 / num_files as f64, 2),
            max_file_size_bytes,
            num_folders: folders.len() as u64,
            num_source_folders,
            avg_source_folder_size_num_files: round_to(
                num_files as f64 / num_source_folders as f64,
                2,
            ),
            avg_source_folder_size_bytes: round_to(
                size_bytes as f64 / num_source_folders as f64,
                0,
            ),
            max_source_folder_size_num_files: source_folders.iter().map(|s| s.0).max().unwrap_or(0),
            max_source_folder_size_bytes: source_folders.iter().map(|s| s.1).max().unwrap_or(0),
            max_tree_level: max_tree_level as u64,
            avg_tree_level,
            max_num_files_level,
            avg_num_files_level,
            tree_size,
            growth: None,
        };

        Ok((summary, levels))
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn folder(id: u128, parent: Option<u128>, path: &str, level: u32, total: u64) -> Node {
        let mut node = Node::new_folder(
            NodeId::new(id),
            parent.map(NodeId::new),
            path,
            level,
            SystemTime::UNIX_EPOCH,
        );
        node.kind = NodeKind::Folder {
            num_files_total: total,
            num_files_direct: 0,
        };
        node
    }

    fn file(id: u128, parent: u128, path: &str, size: u64, level: u32) -> Node {
        Node::new_file(
            NodeId::new(id),
            Some(NodeId::new(parent)),
            path,
            size,
            level,
            SystemTime::UNIX_EPOCH,
        )
    }

    /// root/ { a.py, src/ { b.py, c.py, lib/ { d.py } }, pkg/ { e.py } }
    fn sample() -> NodeTable {
        NodeTable::from_nodes(vec![
            folder(1, None, "", 0, 5),
            file(2, 1, "a.py", 100, 1),
            folder(3, Some(1), "src", 1, 3),
            file(4, 3, "src/b.py", 200, 2),
            file(5, 3, "src/c.py", 300, 2),
            folder(6, Some(3), "src/lib", 2, 1),
            file(7, 6, "src/lib/d.py", 400, 3),
            folder(8, Some(1), "pkg", 1, 1),
            file(9, 8, "pkg/e.py", 500, 2),
        ])
    }

    #[test]
    fn test_annotate_direct_counts() {
        let mut table = sample();
        MetricsAggregator::new().annotate(&mut table);

        let direct = |id| table.get(NodeId::new(id)).unwrap().num_files_direct();
        assert_eq!(direct(1), Some(1));
        assert_eq!(direct(3), Some(2));
        assert_eq!(direct(6), Some(1));
        assert_eq!(direct(8), Some(1));
        assert_eq!(direct(2), None);
    }

    #[test]
    fn test_summary_values() {
        let mut table = sample();
        let metrics = MetricsAggregator::new().aggregate("1.0", &mut table).unwrap();
        let s = &metrics.summary;

        assert!(metrics.warnings.is_empty());
        assert_eq!(s.num_files, 5);
        assert_eq!(s.num_folders, 4);
        assert_eq!(s.size_bytes, 1500);
        assert_eq!(s.avg_file_size_bytes, 300.0);
        assert_eq!(s.max_file_size_bytes, 500);
        assert_eq!(s.num_source_folders, 4);
        assert_eq!(s.avg_source_folder_size_num_files, 1.25);
        assert_eq!(s.avg_source_folder_size_bytes, 375.0);
        assert_eq!(s.max_source_folder_size_num_files, 2);
        assert_eq!(s.max_source_folder_size_bytes, 500);
        assert_eq!(s.max_tree_level, 3);
        // Leaf folders: src/lib (2) and pkg (1).
        assert_eq!(s.avg_tree_level, 1.5);
        // Files per level: 1 -> 1, 2 -> 3, 3 -> 1.
        assert_eq!(s.max_num_files_level, 3);
        assert_eq!(s.avg_num_files_level, 1.67);
        assert_eq!(s.tree_size, Some(1.1133));
    }

    #[test]
    fn test_level_rows() {
        let mut table = sample();
        let metrics = MetricsAggregator::new().aggregate("1.0", &mut table).unwrap();
        let rows: Vec<(u32, u64, u64)> = metrics
            .levels
            .iter()
            .map(|l| (l.level, l.num_files, l.num_folders))
            .collect();
        assert_eq!(rows, vec![(0, 0, 1), (1, 1, 2), (2, 3, 1), (3, 1, 0)]);
    }

    #[test]
    fn test_flat_tree_has_undefined_tree_size() {
        let mut table = NodeTable::from_nodes(vec![
            folder(1, None, "", 0, 2),
            file(2, 1, "a.py", 10, 1),
            file(3, 1, "b.py", 30, 1),
        ]);
        let s = MetricsAggregator::new().aggregate("1.0", &mut table).unwrap().summary;
        assert_eq!(s.avg_tree_level, 0.0);
        assert_eq!(s.tree_size, None);
        assert_eq!(s.num_source_folders, 1);
    }

    #[test]
    fn test_no_files() {
        let mut table = NodeTable::from_nodes(vec![folder(1, None, "", 0, 0)]);
        assert_eq!(
            MetricsAggregator::new().aggregate("1.0", &mut table).unwrap_err(),
            MetricsError::NoSourceFiles
        );
    }

    #[test]
    fn test_missing_root() {
        let mut table = NodeTable::from_nodes(vec![file(2, 1, "a.py", 10, 1)]);
        assert_eq!(
            MetricsAggregator::new().aggregate("1.0", &mut table).unwrap_err(),
            MetricsError::MissingRoot
        );
    }
}
