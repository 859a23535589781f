//! Pipeline orchestration.

use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use treegrowth_analyze::{
    GrowthCalculator, LevelSummary, MetricsAggregator, ReleaseOrder, ReleaseSummary,
    SourceFolderCell, SourceFolderMatrix, source_folders,
};
use treegrowth_core::{NameFilter, PipelineConfig, ScanWarning};
use treegrowth_scan::{IdentityNormalizer, JwalkScanner, SourceFilter};
use treegrowth_store::{Manifest, ReleaseStore, StoreError};

use crate::discover::{Application, Entry, discover};
use crate::error::{PipelineError, ReleaseError, ReleaseErrorKind, Stage};
use crate::report::{ApplicationReport, RunReport, display_warning};

/// Result of processing one release.
#[derive(Debug, Clone)]
pub struct ProcessedRelease {
    pub summary: ReleaseSummary,
    pub levels: Vec<LevelSummary>,
    pub source_folders: Vec<SourceFolderCell>,
    pub warnings: Vec<ScanWarning>,
}

/// Runs walk, filter, aggregation, growth and storage over every
/// application under the input directory.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    names: NameFilter,
}

impl Pipeline {
    /// Create a pipeline, compiling the configured name filters.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let names = config.name_filter()?;
        Ok(Self { config, names })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process every application.
    ///
    /// Returns an error only for fatal conditions; failed releases are
    /// skipped and listed in the report.
    pub fn run(&self) -> Result<RunReport, PipelineError> {
        let start = Instant::now();
        let input = &self.config.input_dir;
        let applications = discover(input).map_err(|source| PipelineError::Input {
            path: input.clone(),
            source,
        })?;
        info!(
            input = %input.display(),
            applications = applications.len(),
            "starting run"
        );

        let applications = if self.config.parallel {
            applications
                .par_iter()
                .map(|app| self.run_application(app))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            applications
                .iter()
                .map(|app| self.run_application(app))
                .collect::<Result<Vec<_>, _>>()?
        };

        let report = RunReport {
            applications,
            duration: start.elapsed(),
        };
        info!(
            processed = report.processed_count(),
            skipped = report.skipped_count(),
            elapsed_ms = report.duration.as_millis() as u64,
            "run finished"
        );
        Ok(report)
    }

    /// Process the releases of one application in sequence and write its
    /// application-level files.
    pub fn run_application(&self, app: &Application) -> Result<ApplicationReport, PipelineError> {
        let store = ReleaseStore::create(&self.config.output_dir, &app.name).map_err(|source| {
            PipelineError::Output {
                application: app.name.clone(),
                source,
            }
        })?;
        let order = ReleaseOrder::for_application(&self.config, &app.name);
        let mut report = ApplicationReport::new(&app.name, order);
        info!(application = %app.name, releases = app.releases.len(), %order, "analyzing application");

        let mut processed = Vec::new();
        for release in &app.releases {
            match self.process_release(&app.name, release, &store) {
                Ok(result) => {
                    report.files.push(treegrowth_store::schema::tree_file(&release.name));
                    processed.push(result);
                }
                Err(err) => {
                    warn!(
                        application = %app.name,
                        release = %release.name,
                        stage = %err.stage,
                        warnings = err.warnings.len(),
                        "release skipped: {}",
                        err.kind
                    );
                    report.skipped.push((&err).into());
                }
            }
        }

        // Release order is decided once; levels and matrix columns follow it.
        let mut summaries: Vec<ReleaseSummary> =
            processed.iter().map(|p| p.summary.clone()).collect();
        order.sort(&mut summaries);
        GrowthCalculator::new().apply(&mut summaries);

        let mut levels: Vec<LevelSummary> =
            processed.iter().flat_map(|p| p.levels.iter().cloned()).collect();
        ReleaseOrder::sort_levels(&mut levels, &summaries);

        let mut matrix = SourceFolderMatrix::new();
        for summary in &summaries {
            if let Some(p) = processed.iter().find(|p| p.summary.release == summary.release) {
                matrix.add_release(summary.release.as_str(), p.source_folders.iter().copied());
            }
        }

        report.warnings = processed.into_iter().flat_map(|p| p.warnings).collect();
        report.releases = summaries;

        if let Err(err) = self.write_application(&store, &levels, &matrix, &mut report) {
            warn!(application = %app.name, "cannot write application files: {err}");
            report.error = Some(err.to_string());
        }

        info!(
            application = %app.name,
            processed = report.releases.len(),
            skipped = report.skipped.len(),
            "application done"
        );
        Ok(report)
    }

    fn write_application(
        &self,
        store: &ReleaseStore,
        levels: &[LevelSummary],
        matrix: &SourceFolderMatrix,
        report: &mut ApplicationReport,
    ) -> Result<(), StoreError> {
        let written = [
            store.write_stats(&report.releases)?,
            store.write_levels(levels)?,
            store.write_matrix(matrix)?,
        ];
        report.files.extend(
            written
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned()),
        );
        report.files.push(treegrowth_store::schema::MANIFEST_FILE.to_string());

        let mut manifest = Manifest::new(&report.application, report.order);
        manifest.files = report.files.clone();
        manifest.releases = report.releases.iter().map(|s| s.release.clone()).collect();
        manifest.skipped = report.skipped.clone();
        manifest.warnings = report.warnings.iter().map(display_warning).collect();
        store.write_manifest(&manifest)?;
        Ok(())
    }

    /// Walk, filter, aggregate and store one release.
    pub fn process_release(
        &self,
        application: &str,
        release: &Entry,
        store: &ReleaseStore,
    ) -> Result<ProcessedRelease, ReleaseError> {
        let fail = |stage: Stage, kind: ReleaseErrorKind| {
            ReleaseError::new(application, &release.name, stage, kind)
        };
        info!(application, release = %release.name, "analyzing release");

        let scan = self.config.scan_config(&release.path);
        let walked = JwalkScanner::new().scan(&scan).map_err(|e| fail(Stage::Walk, e.into()))?;
        let normalized = IdentityNormalizer::new().normalize(walked);
        let mut warnings = normalized.warnings;

        let mut table = SourceFilter::new(self.names.clone())
            .apply(normalized.table)
            .map_err(|e| fail(Stage::Filter, e.into()).with_warnings(&warnings))?;

        let metrics = MetricsAggregator::new()
            .aggregate(&release.name, &mut table)
            .map_err(|e| fail(Stage::Metrics, e.into()).with_warnings(&warnings))?;
        warnings.extend(metrics.warnings);

        store
            .write_tree(&release.name, &table)
            .map_err(|e| fail(Stage::Store, e.into()).with_warnings(&warnings))?;

        debug!(
            application,
            release = %release.name,
            nodes = table.len(),
            warnings = warnings.len(),
            "release stored"
        );

        Ok(ProcessedRelease {
            source_folders: source_folders(&table),
            summary: metrics.summary,
            levels: metrics.levels,
            warnings,
        })
    }
}
