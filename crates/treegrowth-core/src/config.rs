//! Scan and pipeline configuration types.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Source extensions admitted by default.
pub const DEFAULT_FILE_EXTENSIONS: &[&str] = &["py", "java", "h", "c", "cc", "cpp"];

/// Directory names pruned by default.
pub const DEFAULT_EXCLUDE: &[&str] = &[
    "androidTest",
    "animated-base-test",
    "asv-bench",
    "benchmarks",
    "cmake",
    "demo",
    "demos",
    "doc",
    "docs",
    "doc-src",
    "docker-compose",
    "docker-files",
    "examples",
    "imagepipeline-base-test",
    "imagepipeline-test",
    "manual",
    "samples",
    "snap",
    "test",
    "tests",
    "unittest",
    "wiki",
];

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Configuration for walking a single release tree.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Release root to walk.
    pub root: PathBuf,

    /// Include hidden entries (starting with `.`).
    #[builder(default = "false")]
    #[serde(default)]
    pub include_hidden: bool,

    /// Number of threads for the walk (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Admitted file extensions, lower-case, without dot. Empty admits all.
    #[builder(default = "to_strings(DEFAULT_FILE_EXTENSIONS)")]
    #[serde(default)]
    pub file_extensions: Vec<String>,

    /// Glob patterns matched against entry names; matching folders are
    /// pruned together with their subtree.
    #[builder(default = "to_strings(DEFAULT_EXCLUDE)")]
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                return Err("Root path cannot be empty".to_string());
            }
            None => return Err("Root path is required".to_string()),
            _ => {}
        }
        if let Some(ref patterns) = self.exclude {
            compile_globs(patterns).map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a config for walking a path with the default filters.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include_hidden: false,
            threads: 0,
            file_extensions: to_strings(DEFAULT_FILE_EXTENSIONS),
            exclude: to_strings(DEFAULT_EXCLUDE),
        }
    }

    /// Compile the name filters of this config.
    pub fn name_filter(&self) -> Result<NameFilter, ConfigError> {
        NameFilter::new(&self.file_extensions, &self.exclude, self.include_hidden)
    }
}

/// Compiled extension and exclusion rules.
#[derive(Debug, Clone)]
pub struct NameFilter {
    extensions: BTreeSet<CompactString>,
    exclude: GlobSet,
    include_hidden: bool,
}

impl NameFilter {
    /// Compile a filter from raw settings.
    pub fn new(
        extensions: &[String],
        exclude: &[String],
        include_hidden: bool,
    ) -> Result<Self, ConfigError> {
        let extensions = extensions
            .iter()
            .map(|e| CompactString::from(e.trim_start_matches('.').to_lowercase()))
            .collect();
        Ok(Self {
            extensions,
            exclude: compile_globs(exclude)?,
            include_hidden,
        })
    }

    /// A filter that admits everything.
    pub fn permissive() -> Self {
        Self {
            extensions: BTreeSet::new(),
            exclude: GlobSet::empty(),
            include_hidden: true,
        }
    }

    /// Check if an extension is admitted.
    pub fn allows_extension(&self, extension: &str) -> bool {
        self.extensions.is_empty() || self.extensions.contains(extension)
    }

    /// Check if an entry name is excluded.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.is_match(name)
    }

    /// Check if hidden entries should be skipped.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }

    /// Check if any segment of a relative path is excluded or hidden.
    pub fn excludes_path(&self, path: &str) -> bool {
        path.split('/')
            .filter(|s| !s.is_empty())
            .any(|s| self.is_excluded(s) || self.should_skip_hidden(s))
    }
}

fn compile_globs(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ConfigError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::Pattern {
        pattern: patterns.join(","),
        source,
    })
}

/// Configuration of a full pipeline run, loadable from TOML.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
#[builder(setter(into), default, build_fn(validate = "Self::validate"))]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory holding `<application>/<release>` trees.
    pub input_dir: PathBuf,

    /// Directory receiving one sub-directory per application.
    pub output_dir: PathBuf,

    /// Admitted source file extensions.
    pub file_extensions: Vec<String>,

    /// Directory name patterns pruned wholesale.
    pub exclude: Vec<String>,

    /// Applications whose releases are ordered by name instead of mtime.
    pub order_by_name: BTreeSet<String>,

    /// Include hidden entries inside release trees.
    pub include_hidden: bool,

    /// Walker threads (0 = auto-detect).
    pub threads: usize,

    /// Process applications in parallel.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            file_extensions: to_strings(DEFAULT_FILE_EXTENSIONS),
            exclude: to_strings(DEFAULT_EXCLUDE),
            order_by_name: BTreeSet::new(),
            include_hidden: false,
            threads: 0,
            parallel: false,
        }
    }
}

impl PipelineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref patterns) = self.exclude {
            compile_globs(patterns).map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

impl PipelineConfig {
    /// Create a new pipeline config builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        compile_globs(&config.exclude)?;
        Ok(config)
    }

    /// Load a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Check if an application's releases are ordered by name.
    pub fn orders_by_name(&self, application: &str) -> bool {
        self.order_by_name.contains(application)
    }

    /// Scan configuration for one release root.
    ///
    /// When applications run in parallel they already occupy the shared
    /// rayon pool, so an auto-detected thread count walks serially.
    pub fn scan_config(&self, root: impl Into<PathBuf>) -> ScanConfig {
        let threads = match (self.parallel, self.threads) {
            (true, 0) => 1,
            (_, n) => n,
        };
        ScanConfig {
            root: root.into(),
            include_hidden: self.include_hidden,
            threads,
            file_extensions: self.file_extensions.clone(),
            exclude: self.exclude.clone(),
        }
    }

    /// Compile the name filters of this config.
    pub fn name_filter(&self) -> Result<NameFilter, ConfigError> {
        NameFilter::new(&self.file_extensions, &self.exclude, self.include_hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_config_builder() {
        let config = ScanConfig::builder()
            .root("/input/app/1.0")
            .threads(4usize)
            .include_hidden(true)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/input/app/1.0"));
        assert_eq!(config.threads, 4);
        assert!(config.include_hidden);
        assert!(config.file_extensions.contains(&"py".to_string()));
    }

    #[test]
    fn test_scan_config_requires_root() {
        assert!(ScanConfig::builder().build().is_err());
        assert!(ScanConfig::builder().root("").build().is_err());
    }

    #[test]
    fn test_scan_config_rejects_bad_glob() {
        let result = ScanConfig::builder()
            .root("/x")
            .exclude(vec!["[".to_string()])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_name_filter() {
        let filter = ScanConfig::new("/x").name_filter().unwrap();

        assert!(filter.allows_extension("py"));
        assert!(!filter.allows_extension("md"));
        assert!(filter.is_excluded("tests"));
        assert!(!filter.is_excluded("src"));
        assert!(filter.should_skip_hidden(".git"));
        assert!(filter.excludes_path("src/tests/unit"));
        assert!(!filter.excludes_path("src/main"));
    }

    #[test]
    fn test_name_filter_globs_and_dots() {
        let filter = NameFilter::new(
            &[".PY".to_string()],
            &["*-test".to_string()],
            true,
        )
        .unwrap();

        assert!(filter.allows_extension("py"));
        assert!(filter.is_excluded("imagepipeline-test"));
        assert!(!filter.should_skip_hidden(".github"));
    }

    #[test]
    fn test_permissive_filter() {
        let filter = NameFilter::permissive();
        assert!(filter.allows_extension("anything"));
        assert!(!filter.excludes_path(".hidden/tests"));
    }

    #[test]
    fn test_pipeline_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.input_dir, PathBuf::from("input"));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert!(config.exclude.contains(&"tests".to_string()));
        assert!(!config.parallel);
    }

    #[test]
    fn test_pipeline_config_from_toml() {
        let text = r#"
            input_dir = "releases"
            file_extensions = ["py"]
            order_by_name = ["qbittorrent"]
        "#;
        let config = PipelineConfig::from_toml_str(text, Path::new("treegrowth.toml")).unwrap();

        assert_eq!(config.input_dir, PathBuf::from("releases"));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.file_extensions, vec!["py".to_string()]);
        assert!(config.orders_by_name("qbittorrent"));
        assert!(!config.orders_by_name("fresco"));
    }

    #[test]
    fn test_pipeline_config_rejects_unknown_keys() {
        let err = PipelineConfig::from_toml_str("inputdir = 'x'", Path::new("c.toml"));
        assert!(matches!(err, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_scan_config_threads_under_parallel_run() {
        let mut config = PipelineConfig::default();
        assert_eq!(config.scan_config("input/a/1.0").threads, 0);

        config.parallel = true;
        assert_eq!(config.scan_config("input/a/1.0").threads, 1);

        config.threads = 4;
        assert_eq!(config.scan_config("input/a/1.0").threads, 4);
    }

    #[test]
    fn test_pipeline_config_builder() {
        let config = PipelineConfig::builder()
            .input_dir("in")
            .parallel(true)
            .build()
            .unwrap();
        assert_eq!(config.input_dir, PathBuf::from("in"));
        assert!(config.parallel);
        assert_eq!(config.output_dir, PathBuf::from("output"));

        let scan = config.scan_config("in/app/1.0");
        assert_eq!(scan.root, PathBuf::from("in/app/1.0"));
        assert_eq!(scan.exclude, config.exclude);
    }
}
