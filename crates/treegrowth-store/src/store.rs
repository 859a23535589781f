//! Application output directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StoreError;
use crate::schema::{self, MANIFEST_FILE};

/// Output directory of one application: `<output_root>/<application>/`.
#[derive(Debug, Clone)]
pub struct ReleaseStore {
    application: String,
    dir: PathBuf,
}

impl ReleaseStore {
    /// Open the store of an application, creating its directory.
    pub fn create(output_root: impl AsRef<Path>, application: &str) -> Result<Self, StoreError> {
        let dir = output_root.as_ref().join(application);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        debug!(application, dir = %dir.display(), "store opened");
        Ok(Self {
            application: application.to_string(),
            dir,
        })
    }

    /// Open the store of an application for reading.
    ///
    /// Fails with [`StoreError::Io`] when the directory does not exist.
    pub fn open(output_root: impl AsRef<Path>, application: &str) -> Result<Self, StoreError> {
        let dir = output_root.as_ref().join(application);
        let meta = fs::metadata(&dir).map_err(|e| StoreError::io(&dir, e))?;
        if !meta.is_dir() {
            return Err(StoreError::io(
                &dir,
                std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
            ));
        }
        Ok(Self {
            application: application.to_string(),
            dir,
        })
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn tree_path(&self, release: &str) -> PathBuf {
        self.dir.join(schema::tree_file(release))
    }

    pub fn stats_path(&self) -> PathBuf {
        self.dir.join(schema::stats_file(&self.application))
    }

    pub fn levels_path(&self) -> PathBuf {
        self.dir.join(schema::levels_file(&self.application))
    }

    pub fn matrix_path(&self) -> PathBuf {
        self.dir.join(schema::matrix_file(&self.application))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }
}

/// Applications with a manifest under `output_root`, sorted by name.
pub fn stored_applications(output_root: impl AsRef<Path>) -> Result<Vec<String>, StoreError> {
    let root = output_root.as_ref();
    let entries = fs::read_dir(root).map_err(|e| StoreError::io(root, e))?;

    let mut applications: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().join(MANIFEST_FILE).is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !name.starts_with('.'))
        .collect();
    applications.sort();
    Ok(applications)
}
