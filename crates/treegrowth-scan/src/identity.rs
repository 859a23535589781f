//! Stable, path-derived node identity.
//!
//! Walker indices depend on what else is in the tree, so they cannot be used
//! to correlate the same path across releases. Ids are instead derived from
//! the path relative to the release root. Normalizing happens in two passes:
//! the first hashes every path, the second resolves parent links through the
//! walker's parent indices.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::warn;

use treegrowth_core::{Node, NodeId, NodeTable, ScanWarning};

use crate::scanner::WalkedTree;

/// Maps a relative path to a node id.
pub trait PathHasher {
    /// Hash a `/`-separated path relative to the release root.
    fn hash_path(&self, relative_path: &str) -> NodeId;
}

/// BLAKE3 digest truncated to 128 bits.
#[derive(Debug, Default, Clone, Copy)]
pub struct Blake3PathHasher;

impl PathHasher for Blake3PathHasher {
    fn hash_path(&self, relative_path: &str) -> NodeId {
        NodeId::from_digest(blake3::hash(relative_path.as_bytes()).as_bytes())
    }
}

/// Node table with stable ids, plus the warnings gathered so far.
#[derive(Debug, Clone)]
pub struct NormalizedTree {
    /// Canonical root path of the release.
    pub root_path: PathBuf,
    /// Nodes keyed by stable id.
    pub table: NodeTable,
    /// Walk warnings followed by identity warnings.
    pub warnings: Vec<ScanWarning>,
}

/// Replaces walker indices with path-derived ids.
#[derive(Debug, Default, Clone)]
pub struct IdentityNormalizer<H = Blake3PathHasher> {
    hasher: H,
}

impl IdentityNormalizer {
    /// Create a normalizer using BLAKE3.
    pub fn new() -> Self {
        Self {
            hasher: Blake3PathHasher,
        }
    }
}

impl<H: PathHasher> IdentityNormalizer<H> {
    /// Create a normalizer with a custom hasher.
    pub fn with_hasher(hasher: H) -> Self {
        Self { hasher }
    }

    /// Id of a relative path.
    pub fn id_of(&self, relative_path: &str) -> NodeId {
        self.hasher.hash_path(relative_path)
    }

    /// Assign stable ids and resolve parents.
    ///
    /// An entry whose id collides with a different path is dropped with a
    /// [`treegrowth_core::WarningKind::HashCollision`] warning, along with
    /// any entry whose parent was dropped.
    pub fn normalize(&self, walked: WalkedTree) -> NormalizedTree {
        let root_name = walked.root_name();
        let WalkedTree {
            root_path,
            entries,
            mut warnings,
            ..
        } = walked;

        // Pass 1: ids by walker index.
        let mut ids: Vec<Option<NodeId>> = Vec::with_capacity(entries.len());
        let mut owners: HashMap<NodeId, usize> = HashMap::with_capacity(entries.len());
        for (pos, entry) in entries.iter().enumerate() {
            let id = self.hasher.hash_path(&entry.relative_path);
            match owners.get(&id) {
                Some(&owner) if entries[owner].relative_path != entry.relative_path => {
                    let existing = entries[owner].relative_path.as_str();
                    warn!(path = %entry.relative_path, existing, %id, "node id collision");
                    warnings.push(ScanWarning::hash_collision(&entry.relative_path, existing, id));
                    ids.push(None);
                }
                _ => {
                    owners.insert(id, pos);
                    ids.push(Some(id));
                }
            }
        }

        // Pass 2: parent lookup. Parents precede children in walk order.
        let mut table = NodeTable::new();
        for (pos, entry) in entries.into_iter().enumerate() {
            let Some(id) = ids[pos] else { continue };
            let parent = match entry.parent {
                None => None,
                Some(p) => match ids.get(p).copied().flatten() {
                    Some(parent_id) => Some(parent_id),
                    None => {
                        ids[pos] = None;
                        continue;
                    }
                },
            };

            let node = if entry.is_dir {
                let mut node =
                    Node::new_folder(id, parent, entry.relative_path, entry.depth, entry.modified);
                if node.is_root() {
                    node.name = root_name.as_str().into();
                }
                node
            } else {
                Node::new_file(
                    id,
                    parent,
                    entry.relative_path,
                    entry.size,
                    entry.depth,
                    entry.modified,
                )
            };
            table.push(node);
        }

        NormalizedTree {
            root_path,
            table,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{WalkEntry, WalkStats};
    use std::time::{Duration, SystemTime};
    use treegrowth_core::WarningKind;

    fn entry(index: usize, parent: Option<usize>, path: &str, is_dir: bool, depth: u32) -> WalkEntry {
        WalkEntry {
            index,
            parent,
            relative_path: path.into(),
            is_dir,
            size: if is_dir { 0 } else { 10 },
            depth,
            modified: SystemTime::UNIX_EPOCH,
        }
    }

    fn walked(entries: Vec<WalkEntry>) -> WalkedTree {
        WalkedTree {
            root_path: PathBuf::from("/input/demo/1.0"),
            entries,
            stats: WalkStats::default(),
            warnings: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Hashes every path to the same id except the root.
    struct CollidingHasher;

    impl PathHasher for CollidingHasher {
        fn hash_path(&self, relative_path: &str) -> NodeId {
            if relative_path.is_empty() {
                NodeId::new(0)
            } else {
                NodeId::new(1)
            }
        }
    }

    #[test]
    fn test_ids_follow_relative_paths() {
        let normalizer = IdentityNormalizer::new();
        let tree = normalizer.normalize(walked(vec![
            entry(0, None, "", true, 0),
            entry(1, Some(0), "src", true, 1),
            entry(2, Some(1), "src/a.py", false, 2),
        ]));

        let nodes = tree.table.nodes();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].id, normalizer.id_of(""));
        assert_eq!(nodes[0].name, "1.0");
        assert_eq!(nodes[1].id, normalizer.id_of("src"));
        assert_eq!(nodes[2].parent, Some(normalizer.id_of("src")));
        assert_eq!(nodes[2].extension(), "py");
    }

    #[test]
    fn test_collision_drops_entry_and_descendants() {
        let normalizer = IdentityNormalizer::with_hasher(CollidingHasher);
        let tree = normalizer.normalize(walked(vec![
            entry(0, None, "", true, 0),
            entry(1, Some(0), "a.py", false, 1),
            entry(2, Some(0), "lib", true, 1),
            entry(3, Some(2), "lib/b.py", false, 2),
        ]));

        assert_eq!(tree.table.len(), 2);
        let collisions: Vec<_> = tree
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::HashCollision)
            .collect();
        assert_eq!(collisions.len(), 2);
        assert!(tree.table.check_integrity().iter().all(|w| w.kind != WarningKind::DanglingParent));
    }
}
