//! CSV and JSON writers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::{Writer, WriterBuilder};
use tracing::debug;

use treegrowth_analyze::{LevelSummary, Metric, ReleaseSummary, SourceFolderMatrix};
use treegrowth_core::{NodeTable, format_timestamp};

use crate::error::StoreError;
use crate::manifest::Manifest;
use crate::schema::{LEVEL_COLUMNS, MATRIX_KEY_COLUMNS, TREE_COLUMNS, TreeRow, stats_columns};
use crate::store::ReleaseStore;

/// CSV writer that emits its header explicitly, so empty files still carry
/// their columns.
fn csv_writer(path: &Path) -> Result<Writer<File>, StoreError> {
    WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| StoreError::csv(path, e))
}

fn finish(mut writer: Writer<File>, path: &Path, rows: usize) -> Result<(), StoreError> {
    writer.flush().map_err(|e| StoreError::io(path, e))?;
    debug!(path = %path.display(), rows, "file written");
    Ok(())
}

fn stats_record(summary: &ReleaseSummary) -> Vec<String> {
    let mut record = vec![summary.release.clone(), format_timestamp(summary.modified)];
    record.extend(summary.metrics().map(|(_, value)| value.to_string()));
    for metric in Metric::all() {
        let growth = summary
            .growth
            .as_ref()
            .map(|g| g.get(metric))
            .unwrap_or_default();
        record.push(growth.absolute.map(|d| d.to_string()).unwrap_or_default());
        record.push(growth.percent.map(|p| p.to_string()).unwrap_or_default());
    }
    record
}

impl ReleaseStore {
    /// Write `tree_<release>.csv`.
    pub fn write_tree(&self, release: &str, table: &NodeTable) -> Result<PathBuf, StoreError> {
        let path = self.tree_path(release);
        let mut writer = csv_writer(&path)?;
        writer
            .write_record(TREE_COLUMNS)
            .map_err(|e| StoreError::csv(&path, e))?;
        for node in table {
            writer
                .serialize(TreeRow::from_node(node))
                .map_err(|e| StoreError::csv(&path, e))?;
        }
        finish(writer, &path, table.len())?;
        Ok(path)
    }

    /// Write `stats_<application>.csv`, one row per summary in slice order.
    pub fn write_stats(&self, summaries: &[ReleaseSummary]) -> Result<PathBuf, StoreError> {
        let path = self.stats_path();
        let mut writer = csv_writer(&path)?;
        writer
            .write_record(stats_columns())
            .map_err(|e| StoreError::csv(&path, e))?;
        for summary in summaries {
            writer
                .write_record(stats_record(summary))
                .map_err(|e| StoreError::csv(&path, e))?;
        }
        finish(writer, &path, summaries.len())?;
        Ok(path)
    }

    /// Write `files-per-level_<application>.csv`.
    pub fn write_levels(&self, levels: &[LevelSummary]) -> Result<PathBuf, StoreError> {
        let path = self.levels_path();
        let mut writer = csv_writer(&path)?;
        writer
            .write_record(LEVEL_COLUMNS)
            .map_err(|e| StoreError::csv(&path, e))?;
        for level in levels {
            writer
                .serialize(level)
                .map_err(|e| StoreError::csv(&path, e))?;
        }
        finish(writer, &path, levels.len())?;
        Ok(path)
    }

    /// Write `source-folders_<application>.csv`.
    pub fn write_matrix(&self, matrix: &SourceFolderMatrix) -> Result<PathBuf, StoreError> {
        let path = self.matrix_path();
        let mut writer = csv_writer(&path)?;
        let header = MATRIX_KEY_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(matrix.releases().iter().cloned());
        writer
            .write_record(header)
            .map_err(|e| StoreError::csv(&path, e))?;
        for row in matrix.rows() {
            let record = [row.id.to_hex(), row.level.to_string()]
                .into_iter()
                .chain(row.cells.iter().map(|c| c.map(|n| n.to_string()).unwrap_or_default()));
            writer
                .write_record(record)
                .map_err(|e| StoreError::csv(&path, e))?;
        }
        finish(writer, &path, matrix.len())?;
        Ok(path)
    }

    /// Write `manifest.json`.
    pub fn write_manifest(&self, manifest: &Manifest) -> Result<PathBuf, StoreError> {
        let path = self.manifest_path();
        let file = File::create(&path).map_err(|e| StoreError::io(&path, e))?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, manifest).map_err(|e| StoreError::json(&path, e))?;
        out.write_all(b"\n").map_err(|e| StoreError::io(&path, e))?;
        out.flush().map_err(|e| StoreError::io(&path, e))?;
        debug!(path = %path.display(), "manifest written");
        Ok(path)
    }
}
