//! JWalk-based release tree walker.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use compact_str::CompactString;
use jwalk::{Parallelism, WalkDir};
use tracing::{debug, warn};

use treegrowth_core::{NameFilter, ScanConfig, ScanError, ScanWarning, WarningKind, extension_of};

/// One entry produced by the walk, before stable ids are assigned.
#[derive(Debug, Clone)]
pub struct WalkEntry {
    /// Walker-assigned index, equal to the entry's position in the walk.
    pub index: usize,
    /// Index of the containing folder (`None` for the root).
    pub parent: Option<usize>,
    /// `/`-separated path relative to the walk root (empty for the root).
    pub relative_path: CompactString,
    /// Whether the entry is a folder.
    pub is_dir: bool,
    /// File length in bytes (0 for folders).
    pub size: u64,
    /// Depth from the walk root (root = 0).
    pub depth: u32,
    /// Last modification time.
    pub modified: SystemTime,
}

/// Counters collected while walking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Number of files recorded.
    pub files: u64,
    /// Number of folders recorded, the root included.
    pub folders: u64,
    /// Total size of recorded files.
    pub bytes: u64,
    /// Maximum depth reached.
    pub max_depth: u32,
}

impl WalkStats {
    /// Update stats with a file entry.
    pub fn record_file(&mut self, size: u64, depth: u32) {
        self.files += 1;
        self.bytes += size;
        self.max_depth = self.max_depth.max(depth);
    }

    /// Record a folder.
    pub fn record_dir(&mut self, depth: u32) {
        self.folders += 1;
        self.max_depth = self.max_depth.max(depth);
    }
}

/// Flat result of walking one release root.
#[derive(Debug, Clone)]
pub struct WalkedTree {
    /// Canonical root path that was walked.
    pub root_path: PathBuf,
    /// Entries in walk order; parents always precede their children.
    pub entries: Vec<WalkEntry>,
    /// Summary counters.
    pub stats: WalkStats,
    /// Entries that could not be read.
    pub warnings: Vec<ScanWarning>,
    /// Duration of the walk.
    pub duration: Duration,
}

impl WalkedTree {
    /// Base name of the walked root.
    pub fn root_name(&self) -> String {
        self.root_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.root_path.to_string_lossy().to_string())
    }
}

/// Release tree walker using jwalk for traversal.
#[derive(Debug, Default, Clone, Copy)]
pub struct JwalkScanner;

impl JwalkScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self
    }

    /// Walk the root of the given config.
    ///
    /// Hidden entries, folders matching an exclude pattern and files with a
    /// non-admitted extension are pruned while walking.
    pub fn scan(&self, config: &ScanConfig) -> Result<WalkedTree, ScanError> {
        let start = Instant::now();
        let root_path = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        let mut listing = std::fs::read_dir(&root_path).map_err(|e| ScanError::io(&root_path, e))?;
        if listing.next().is_none() {
            return Err(ScanError::EmptyRelease { path: root_path });
        }

        let filter = config.name_filter().map_err(|e| ScanError::InvalidConfig {
            message: e.to_string(),
        })?;

        let mut stats = WalkStats::default();
        let mut warnings = Vec::new();
        let entries = self.collect_entries(config, &root_path, filter, &mut stats, &mut warnings)?;

        let duration = start.elapsed();
        debug!(
            root = %root_path.display(),
            files = stats.files,
            folders = stats.folders,
            ?duration,
            "walk finished"
        );

        Ok(WalkedTree {
            root_path,
            entries,
            stats,
            warnings,
            duration,
        })
    }

    /// Collect all entries using jwalk.
    ///
    /// Unreadable entries become warnings. A busy thread pool or an
    /// unreadable root aborts the walk, since the tree would be incomplete.
    fn collect_entries(
        &self,
        config: &ScanConfig,
        root_path: &Path,
        filter: NameFilter,
        stats: &mut WalkStats,
        warnings: &mut Vec<ScanWarning>,
    ) -> Result<Vec<WalkEntry>, ScanError> {
        let walker = WalkDir::new(root_path)
            .parallelism(parallelism(config.threads))
            .skip_hidden(!config.include_hidden)
            .follow_links(false)
            .sort(true)
            .min_depth(0)
            .process_read_dir(move |_depth, _path, _state, children| {
                children.retain(|entry| match entry {
                    Ok(e) => keep_entry(&filter, &e.file_name().to_string_lossy(), e.file_type()),
                    Err(_) => true,
                });
            });

        let mut entries: Vec<WalkEntry> = Vec::new();
        let mut dir_index: HashMap<PathBuf, usize> = HashMap::new();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    if err.is_busy() || err.depth() == 0 || entries.is_empty() {
                        return Err(ScanError::WalkAborted {
                            path: root_path.to_path_buf(),
                            message: err.to_string(),
                        });
                    }
                    warn!(path = %path.display(), error = %err, "skipping unreadable entry");
                    let warning = match err.io_error() {
                        Some(io) => ScanWarning::read_error(path, io),
                        None => ScanWarning::new(path, err.to_string(), WarningKind::ReadError),
                    };
                    warnings.push(warning);
                    continue;
                }
            };

            let path = entry.path();
            let file_type = entry.file_type();
            if !file_type.is_dir() && !file_type.is_file() {
                continue;
            }

            let depth = entry.depth() as u32;
            let parent = if depth == 0 {
                None
            } else {
                match path.parent().and_then(|p| dir_index.get(p)) {
                    Some(&idx) => Some(idx),
                    None => {
                        debug!(path = %path.display(), "dropping entry without recorded parent");
                        warnings.push(ScanWarning::missing_parent(&path));
                        continue;
                    }
                }
            };

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) if depth == 0 => {
                    return Err(ScanError::WalkAborted {
                        path: root_path.to_path_buf(),
                        message: err.to_string(),
                    });
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping entry without metadata");
                    warnings.push(ScanWarning::new(
                        &path,
                        err.to_string(),
                        WarningKind::MetadataError,
                    ));
                    continue;
                }
            };

            let modified = match metadata.modified() {
                Ok(time) => time,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "modification time unavailable");
                    warnings.push(ScanWarning::unknown_mtime(&path, &err));
                    UNIX_EPOCH
                }
            };

            let index = entries.len();
            let is_dir = file_type.is_dir();
            let size = if is_dir { 0 } else { metadata.len() };

            if is_dir {
                stats.record_dir(depth);
                dir_index.insert(path.clone(), index);
            } else {
                stats.record_file(size, depth);
                if stats.files % 1000 == 0 {
                    debug!(files = stats.files, current = %path.display(), "walk progress");
                }
            }

            entries.push(WalkEntry {
                index,
                parent,
                relative_path: relative_path(root_path, &path),
                is_dir,
                size,
                depth,
                modified,
            });
        }

        Ok(entries)
    }
}

/// Map a thread count to a jwalk parallelism (0 = shared rayon pool).
fn parallelism(threads: usize) -> Parallelism {
    match threads {
        0 => Parallelism::RayonDefaultPool {
            busy_timeout: Duration::from_secs(1),
        },
        1 => Parallelism::Serial,
        n => Parallelism::RayonNewPool(n),
    }
}

/// Decide during the walk whether an entry is kept.
fn keep_entry(filter: &NameFilter, name: &str, file_type: std::fs::FileType) -> bool {
    if filter.should_skip_hidden(name) {
        return false;
    }
    if file_type.is_dir() {
        !filter.is_excluded(name)
    } else if file_type.is_file() {
        filter.allows_extension(&extension_of(name))
    } else {
        false
    }
}

/// Render a path relative to the root with `/` separators.
fn relative_path(root: &Path, path: &Path) -> CompactString {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut out = CompactString::default();
    for component in relative.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}
