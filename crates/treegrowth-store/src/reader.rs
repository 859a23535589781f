//! CSV and JSON readers.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::SystemTime;

use csv::{Reader, ReaderBuilder, StringRecord};
use serde::de::DeserializeOwned;

use treegrowth_analyze::{
    LevelSummary, Metric, MetricDelta, MetricGrowth, ReleaseGrowth, ReleaseSummary,
    SourceFolderMatrix,
};
use treegrowth_core::parse_timestamp;

use crate::error::StoreError;
use crate::manifest::Manifest;
use crate::schema::{SCHEMA_VERSION, TreeRow};
use crate::store::ReleaseStore;

fn csv_reader(path: &Path) -> Result<Reader<File>, StoreError> {
    ReaderBuilder::new()
        .from_path(path)
        .map_err(|e| StoreError::csv(path, e))
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let mut reader = csv_reader(path)?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| StoreError::csv(path, e))
}

/// Column positions of a stats header.
struct StatsLayout {
    release: usize,
    mtime: usize,
    metrics: Vec<(Metric, usize)>,
    growth: Vec<(Metric, usize, usize)>,
}

impl StatsLayout {
    fn from_header(path: &Path, header: &StringRecord) -> Result<Self, StoreError> {
        let find = |column: &str| header.iter().position(|h| h == column);
        let require = |column: &str| {
            find(column).ok_or_else(|| StoreError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            })
        };

        let metrics = Metric::all()
            .map(|m| require(m.name()).map(|i| (m, i)))
            .collect::<Result<Vec<_>, _>>()?;
        // Growth columns are optional on read.
        let growth = Metric::all()
            .filter_map(|m| Some((m, find(&m.growth_column())?, find(&m.growth_pct_column())?)))
            .collect();

        Ok(Self {
            release: require("release")?,
            mtime: require("mtime")?,
            metrics,
            growth,
        })
    }
}

/// Parse an optional numeric field; empty means undefined.
fn parse_field<T: std::str::FromStr>(
    path: &Path,
    record: usize,
    column: &str,
    value: &str,
) -> Result<Option<T>, StoreError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| StoreError::InvalidValue {
            path: path.to_path_buf(),
            record,
            column: column.to_string(),
            value: value.to_string(),
        })
}

impl ReleaseStore {
    /// Read `stats_<application>.csv` back into summaries, in file order.
    ///
    /// Growth is restored when the growth columns are present.
    pub fn read_stats(&self) -> Result<Vec<ReleaseSummary>, StoreError> {
        let path = self.stats_path();
        let mut reader = csv_reader(&path)?;
        let header = reader.headers().map_err(|e| StoreError::csv(&path, e))?.clone();
        let layout = StatsLayout::from_header(&path, &header)?;

        let mut summaries: Vec<ReleaseSummary> = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|e| StoreError::csv(&path, e))?;
            let field = |i: usize| record.get(i).unwrap_or_default();

            let modified = match field(layout.mtime) {
                "" => SystemTime::UNIX_EPOCH,
                text => parse_timestamp(text).ok_or_else(|| StoreError::InvalidValue {
                    path: path.clone(),
                    record: index + 1,
                    column: "mtime".to_string(),
                    value: text.to_string(),
                })?,
            };
            let mut summary = ReleaseSummary::empty(field(layout.release), modified);

            for &(metric, i) in &layout.metrics {
                let value = parse_field::<f64>(&path, index + 1, metric.name(), field(i))?;
                summary.set_value(metric, value);
            }

            if !layout.growth.is_empty() {
                let mut growth = ReleaseGrowth::undefined();
                growth.previous = summaries.last().map(|s| s.release.clone());
                for &(metric, abs_i, pct_i) in &layout.growth {
                    let column = metric.growth_column();
                    let absolute = if metric.is_count() {
                        parse_field::<i64>(&path, index + 1, &column, field(abs_i))?
                            .map(MetricDelta::Count)
                    } else {
                        parse_field::<f64>(&path, index + 1, &column, field(abs_i))?
                            .map(MetricDelta::Ratio)
                    };
                    let percent = parse_field::<f64>(
                        &path,
                        index + 1,
                        &metric.growth_pct_column(),
                        field(pct_i),
                    )?;
                    growth
                        .values
                        .insert(metric, MetricGrowth { absolute, percent });
                }
                summary.growth = Some(growth);
            }

            summaries.push(summary);
        }
        Ok(summaries)
    }

    /// Read `files-per-level_<application>.csv`.
    pub fn read_levels(&self) -> Result<Vec<LevelSummary>, StoreError> {
        read_rows(&self.levels_path())
    }

    /// Read `tree_<release>.csv`.
    pub fn read_tree(&self, release: &str) -> Result<Vec<TreeRow>, StoreError> {
        read_rows(&self.tree_path(release))
    }

    /// Read `manifest.json`, rejecting other schema versions.
    pub fn read_manifest(&self) -> Result<Manifest, StoreError> {
        let path = self.manifest_path();
        let file = File::open(&path).map_err(|e| StoreError::io(&path, e))?;
        let manifest: Manifest = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| StoreError::json(&path, e))?;
        if manifest.schema_version != SCHEMA_VERSION {
            return Err(StoreError::SchemaVersion {
                path,
                found: manifest.schema_version,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(manifest)
    }

    /// Build the source-folder matrix from the stored trees of `releases`.
    pub fn matrix_from_trees(&self, releases: &[String]) -> Result<SourceFolderMatrix, StoreError> {
        let mut matrix = SourceFolderMatrix::new();
        for release in releases {
            let rows = self.read_tree(release)?;
            matrix.add_release(release.as_str(), rows.iter().filter_map(TreeRow::source_folder));
        }
        Ok(matrix)
    }
}
