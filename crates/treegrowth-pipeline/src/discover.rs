//! Application and release discovery under the input root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

/// A directory found under the input root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
}

/// An application and its release directories, sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub name: String,
    pub path: PathBuf,
    pub releases: Vec<Entry>,
}

/// Non-hidden sub-directories of `dir`, sorted by name.
///
/// Plain files, symlinks and names that are not valid UTF-8 are ignored.
pub fn list_dirs(dir: &Path) -> io::Result<Vec<Entry>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), "skipping unreadable entry: {e}");
                continue;
            }
        };
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            dirs.push(Entry {
                name,
                path: entry.path(),
            });
        }
    }
    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(dirs)
}

/// Discover `<input_root>/<application>/<release>` directories.
///
/// An application whose directory cannot be listed is returned without
/// releases and a warning is logged.
pub fn discover(input_root: &Path) -> io::Result<Vec<Application>> {
    let applications = list_dirs(input_root)?
        .into_iter()
        .map(|app| {
            let releases = list_dirs(&app.path).unwrap_or_else(|e| {
                warn!(application = %app.name, "cannot list releases: {e}");
                Vec::new()
            });
            Application {
                name: app.name,
                path: app.path,
                releases,
            }
        })
        .collect();
    Ok(applications)
}
