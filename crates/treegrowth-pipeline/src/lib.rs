//! Batch orchestration for treegrowth.
//!
//! For every `input/<application>/<release>` directory the pipeline walks,
//! filters and aggregates the release tree and stores it. Once all releases
//! of an application are processed they are ordered, growth is computed and
//! the application-level files are written.
//!
//! A release that fails at any stage is skipped and listed in the
//! [`RunReport`]; only an unreadable input root or an output directory that
//! cannot be created stops the run.
//!
//! ```rust,no_run
//! use treegrowth_core::PipelineConfig;
//! use treegrowth_pipeline::Pipeline;
//!
//! let report = Pipeline::new(PipelineConfig::default()).unwrap().run().unwrap();
//! println!("{} releases, {} skipped", report.processed_count(), report.skipped_count());
//! ```

mod discover;
mod error;
mod report;
mod runner;

pub use discover::{Application, Entry, discover, list_dirs};
pub use error::{PipelineError, ReleaseError, ReleaseErrorKind, Stage};
pub use report::{ApplicationReport, RunReport};
pub use runner::{Pipeline, ProcessedRelease};
