//! Core types for treegrowth.
//!
//! This crate provides the data structures shared by every stage of the
//! release analysis pipeline: nodes and node tables, scan and pipeline
//! configuration, and the error and warning types.

mod config;
mod error;
mod node;
mod table;

pub use config::{
    DEFAULT_EXCLUDE, DEFAULT_FILE_EXTENSIONS, NameFilter, PipelineConfig, PipelineConfigBuilder,
    ScanConfig, ScanConfigBuilder,
};
pub use error::{ConfigError, ScanError, ScanWarning, WarningKind};
pub use node::{
    Node, NodeId, NodeKind, ParseNodeIdError, extension_of, format_timestamp, parse_timestamp,
};
pub use table::NodeTable;
