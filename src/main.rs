//! treegrowth - Directory-tree evolution statistics for software releases.
//!
//! Usage:
//!   treegrowth analyze             Analyze every release under the input directory
//!   treegrowth summary             Compare first and last release of each application
//!   treegrowth matrix <APP>        Write the source-folder matrix of an application
//!   treegrowth --help              Show help

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::EnvFilter;

use treegrowth_analyze::{FirstLastComparison, Metric, compare_first_last};
use treegrowth_core::PipelineConfig;
use treegrowth_pipeline::{ApplicationReport, Pipeline, RunReport};
use treegrowth_store::{ReleaseStore, stored_applications};

#[derive(Parser)]
#[command(
    name = "treegrowth",
    version,
    about = "Directory-tree evolution statistics for software releases",
    long_about = "treegrowth walks every release of every application under an input \
                  directory, computes size and shape metrics of the source tree and \
                  their growth from release to release, and writes them as CSV."
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze all applications and write the output files
    Analyze {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Input directory (overrides the config)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory (overrides the config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Process applications in parallel
        #[arg(long)]
        parallel: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Number of files in the first and last release of each application
    Summary {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory to read from (overrides the config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Rebuild the source-folder matrix of an application from its stored trees
    Matrix {
        /// Application name
        application: String,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory (overrides the config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Analyze {
            config,
            input,
            output,
            parallel,
            format,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(input) = input {
                config.input_dir = input;
            }
            if let Some(output) = output {
                config.output_dir = output;
            }
            config.parallel |= parallel;
            run_analyze(config, format)
        }
        Command::Summary {
            config,
            output,
            format,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(output) = output {
                config.output_dir = output;
            }
            run_summary(&config.output_dir, format)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Matrix {
            application,
            config,
            output,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(output) = output {
                config.output_dir = output;
            }
            run_matrix(&config.output_dir, &application)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Install the stderr logger. `RUST_LOG` takes precedence over the flags.
fn init_logging(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Cannot load config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

/// Run the pipeline and print its report.
fn run_analyze(config: PipelineConfig, format: OutputFormat) -> Result<ExitCode> {
    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    let report = pipeline.run().context("Analysis failed")?;

    match format {
        OutputFormat::Text => print_run_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    // 2 signals a partial run: some releases or files are missing.
    Ok(if report.has_failures() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

/// Compare first and last stored release of every application.
fn run_summary(output_dir: &Path, format: OutputFormat) -> Result<()> {
    let applications = stored_applications(output_dir)
        .with_context(|| format!("Cannot list {}", output_dir.display()))?;

    let mut comparisons = Vec::new();
    for application in &applications {
        let store = ReleaseStore::open(output_dir, application)?;
        let summaries = store
            .read_stats()
            .with_context(|| format!("Cannot read stats of {application}"))?;
        comparisons.extend(compare_first_last(application, &summaries));
    }

    match format {
        OutputFormat::Text => print_comparisons(&comparisons),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&comparisons)?),
    }
    Ok(())
}

/// Rebuild and write the source-folder matrix of one application.
fn run_matrix(output_dir: &Path, application: &str) -> Result<()> {
    let store = ReleaseStore::open(output_dir, application)
        .with_context(|| format!("No stored output for {application}"))?;
    let manifest = store.read_manifest()?;
    let matrix = store
        .matrix_from_trees(&manifest.releases)
        .context("Cannot read stored trees")?;
    let path = store.write_matrix(&matrix)?;

    println!(
        "{} source folders across {} releases written to {}",
        matrix.len(),
        matrix.releases().len(),
        path.display()
    );
    Ok(())
}

fn print_run_report(report: &RunReport) {
    for app in &report.applications {
        print_application(app);
    }

    println!(
        "{} releases analyzed, {} skipped, {} warnings in {:.2}s",
        report.processed_count(),
        report.skipped_count(),
        report.warning_count(),
        report.duration.as_secs_f64()
    );
}

fn print_application(app: &ApplicationReport) {
    println!();
    println!("{}", "─".repeat(72));
    println!(" {} (ordered by {})", app.application, app.order);
    println!("{}", "─".repeat(72));
    println!(
        "   {:<16} {:>8} {:>12} {:>8} {:>10} {:>12}",
        "release", "files", "size", "folders", "tree size", "file growth"
    );

    for summary in &app.releases {
        let growth = summary
            .growth
            .as_ref()
            .map(|g| g.get(Metric::NumFiles))
            .unwrap_or_default();
        let growth = match (growth.absolute, growth.percent) {
            (Some(abs), Some(pct)) => format!("{abs:+} ({pct}%)"),
            (Some(abs), None) => format!("{abs:+}"),
            _ => String::new(),
        };
        let tree_size = summary
            .tree_size
            .map(|t| format!("{t:.4}"))
            .unwrap_or_default();

        println!(
            "   {:<16} {:>8} {:>12} {:>8} {:>10} {:>12}",
            truncate(&summary.release, 16),
            summary.num_files,
            format_size(summary.size_bytes),
            summary.num_folders,
            tree_size,
            growth
        );
    }

    for skipped in &app.skipped {
        println!("   skipped {} at {}: {}", skipped.release, skipped.stage, skipped.reason);
    }
    if let Some(error) = &app.error {
        println!("   error: {error}");
    }
}

fn print_comparisons(comparisons: &[FirstLastComparison]) {
    println!(
        " {:<20} {:>12} {:>12} {:>10} {:>10}",
        "application", "first", "last", "growth", "growth %"
    );
    println!("{}", "─".repeat(70));
    for cmp in comparisons {
        println!(
            " {:<20} {:>12} {:>12} {:>10} {:>10}",
            truncate(&cmp.application, 20),
            cmp.num_files_first,
            cmp.num_files_last,
            cmp.growth,
            cmp.growth_pct.map(|p| p.to_string()).unwrap_or_default()
        );
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to max characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 1).collect();
        format!("{head}…")
    }
}
