//! Flat node table for one release snapshot.

use std::collections::HashMap;

use crate::error::{ScanWarning, WarningKind};
use crate::node::{Node, NodeId, NodeKind};

/// All nodes of one release, in walk order (parents before children).
#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
}

impl NodeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from nodes. Later duplicates of an id are ignored by
    /// the lookup index.
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        for (pos, node) in nodes.iter().enumerate() {
            index.entry(node.id).or_insert(pos);
        }
        Self { nodes, index }
    }

    /// Append a node.
    pub fn push(&mut self, node: Node) {
        self.index.entry(node.id).or_insert(self.nodes.len());
        self.nodes.push(node);
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the table has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Mutable access to all nodes. Ids must not be changed through it.
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Consume the table, returning its nodes.
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    /// Look up a node by id.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&pos| &self.nodes[pos])
    }

    /// Check if an id is present.
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// The release root (the node without a parent).
    pub fn root(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.is_root())
    }

    /// Iterate over file nodes.
    pub fn files(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_file())
    }

    /// Iterate over folder nodes.
    pub fn folders(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_folder())
    }

    /// Number of file nodes.
    pub fn file_count(&self) -> usize {
        self.files().count()
    }

    /// Number of folder nodes.
    pub fn folder_count(&self) -> usize {
        self.folders().count()
    }

    /// Positions of the direct children of every node that has any.
    pub fn children_index(&self) -> HashMap<NodeId, Vec<usize>> {
        let mut children: HashMap<NodeId, Vec<usize>> = HashMap::new();
        for (pos, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                children.entry(parent).or_default().push(pos);
            }
        }
        children
    }

    /// Check the structural invariants of the table.
    ///
    /// Reports parents that are missing or are not folders, and folders
    /// whose `num_files_total` differs from the sum over their children.
    pub fn check_integrity(&self) -> Vec<ScanWarning> {
        let mut warnings = Vec::new();

        for node in &self.nodes {
            if let Some(parent) = node.parent {
                match self.get(parent) {
                    Some(p) if p.is_folder() => {}
                    _ => warnings.push(ScanWarning::new(
                        node.path.as_str(),
                        format!("Parent {parent} does not resolve to a folder"),
                        WarningKind::DanglingParent,
                    )),
                }
            }
        }

        let children = self.children_index();
        for node in &self.nodes {
            if let NodeKind::Folder {
                num_files_total, ..
            } = node.kind
            {
                let expected: u64 = children
                    .get(&node.id)
                    .map(|c| c.iter().map(|&pos| self.nodes[pos].file_count()).sum())
                    .unwrap_or(0);
                if expected != num_files_total {
                    warnings.push(ScanWarning::count_mismatch(
                        &node.path,
                        num_files_total,
                        expected,
                    ));
                }
            }
        }

        warnings
    }
}

impl FromIterator<Node> for NodeTable {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self::from_nodes(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a NodeTable {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
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

    fn file(id: u128, parent: u128, path: &str, level: u32) -> Node {
        Node::new_file(
            NodeId::new(id),
            Some(NodeId::new(parent)),
            path,
            10,
            level,
            SystemTime::UNIX_EPOCH,
        )
    }

    #[test]
    fn test_table_lookup() {
        let table: NodeTable = vec![
            folder(1, None, "", 0, 1),
            file(2, 1, "a.py", 1),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.len(), 2);
        assert_eq!(table.root().unwrap().id, NodeId::new(1));
        assert_eq!(table.get(NodeId::new(2)).unwrap().name, "a.py");
        assert_eq!(table.file_count(), 1);
        assert_eq!(table.folder_count(), 1);
        assert!(table.check_integrity().is_empty());
    }

    #[test]
    fn test_integrity_reports_mismatch_and_dangling() {
        let table = NodeTable::from_nodes(vec![
            folder(1, None, "", 0, 5),
            file(2, 1, "a.py", 1),
            file(3, 99, "ghost/b.py", 2),
        ]);

        let warnings = table.check_integrity();
        assert!(warnings.iter().any(|w| w.kind == WarningKind::CountMismatch));
        assert!(warnings.iter().any(|w| w.kind == WarningKind::DanglingParent));
    }
}
