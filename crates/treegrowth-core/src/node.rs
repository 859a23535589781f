//! File and folder node types.

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Stable identifier for a node, derived from its path relative to the
/// release root.
///
/// Serialized as 32 lower-case hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct NodeId(pub u128);

impl NodeId {
    /// Create a new NodeId from a u128.
    pub fn new(id: u128) -> Self {
        Self(id)
    }

    /// Build an id from the first 16 bytes of a digest.
    pub fn from_digest(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 16];
        let len = bytes.len().min(16);
        buf[..len].copy_from_slice(&bytes[..len]);
        Self(u128::from_be_bytes(buf))
    }

    /// Get the id as a hex string.
    pub fn to_hex(&self) -> String {
        format!("{:032x}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Error returned when parsing a [`NodeId`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid node id: {0:?}")]
pub struct ParseNodeIdError(pub String);

impl FromStr for NodeId {
    type Err = ParseNodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(ParseNodeIdError(s.to_string()));
        }
        u128::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| ParseNodeIdError(s.to_string()))
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.to_hex()
    }
}

impl TryFrom<String> for NodeId {
    type Error = ParseNodeIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Type of node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Regular file.
    File {
        /// Lower-cased extension without the leading dot.
        extension: CompactString,
    },
    /// Folder.
    Folder {
        /// Number of files in this subtree.
        num_files_total: u64,
        /// Number of files among the immediate children.
        num_files_direct: u64,
    },
}

impl NodeKind {
    /// Check if this is a folder.
    pub fn is_folder(&self) -> bool {
        matches!(self, NodeKind::Folder { .. })
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File { .. })
    }
}

/// A single file or folder of a release snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable identifier.
    pub id: NodeId,

    /// Identifier of the containing folder (`None` for the release root).
    pub parent: Option<NodeId>,

    /// Base name.
    pub name: CompactString,

    /// `/`-separated path relative to the release root (empty for the root).
    pub path: CompactString,

    /// Node type and associated counters.
    pub kind: NodeKind,

    /// Size in bytes (sum of contained files for folders).
    pub size: u64,

    /// Depth from the release root (root = 0).
    pub level: u32,

    /// Last modification time.
    pub modified: SystemTime,
}

impl Node {
    /// Create a new file node.
    pub fn new_file(
        id: NodeId,
        parent: Option<NodeId>,
        path: impl Into<CompactString>,
        size: u64,
        level: u32,
        modified: SystemTime,
    ) -> Self {
        let path = path.into();
        let name = base_name(&path);
        let extension = extension_of(&name);
        Self {
            id,
            parent,
            name,
            path,
            kind: NodeKind::File { extension },
            size,
            level,
            modified,
        }
    }

    /// Create a new folder node with zeroed counters.
    pub fn new_folder(
        id: NodeId,
        parent: Option<NodeId>,
        path: impl Into<CompactString>,
        level: u32,
        modified: SystemTime,
    ) -> Self {
        let path = path.into();
        Self {
            id,
            parent,
            name: base_name(&path),
            path,
            kind: NodeKind::Folder {
                num_files_total: 0,
                num_files_direct: 0,
            },
            size: 0,
            level,
            modified,
        }
    }

    /// Check if this node is a folder.
    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Check if this node is the release root.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Extension for files, empty for folders.
    pub fn extension(&self) -> &str {
        match &self.kind {
            NodeKind::File { extension } => extension.as_str(),
            NodeKind::Folder { .. } => "",
        }
    }

    /// Subtree file count for folders, 1 for files.
    pub fn file_count(&self) -> u64 {
        match &self.kind {
            NodeKind::Folder {
                num_files_total, ..
            } => *num_files_total,
            NodeKind::File { .. } => 1,
        }
    }

    /// Direct file count for folders, `None` for files.
    pub fn num_files_direct(&self) -> Option<u64> {
        match &self.kind {
            NodeKind::Folder {
                num_files_direct, ..
            } => Some(*num_files_direct),
            NodeKind::File { .. } => None,
        }
    }

    /// Subtree file count for folders, `None` for files.
    pub fn num_files_total(&self) -> Option<u64> {
        match &self.kind {
            NodeKind::Folder {
                num_files_total, ..
            } => Some(*num_files_total),
            NodeKind::File { .. } => None,
        }
    }

    /// Iterate over the relative path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }
}

/// Last segment of a relative path.
fn base_name(path: &str) -> CompactString {
    path.rsplit('/').next().unwrap_or_default().into()
}

/// Lower-cased extension of a file name, empty when there is none.
///
/// A leading dot (`.gitignore`) does not start an extension.
pub fn extension_of(name: &str) -> CompactString {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => name[idx + 1..].to_lowercase().into(),
        _ => CompactString::default(),
    }
}

/// Format a timestamp as RFC 3339 (UTC, second precision).
pub fn format_timestamp(time: SystemTime) -> String {
    let dt: DateTime<Utc> = time.into();
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC 3339 timestamp.
pub fn parse_timestamp(s: &str) -> Option<SystemTime> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).into())
}
