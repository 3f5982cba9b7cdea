//! PageCraft CLI
//!
//! The `pagecraft` command turns a captured landing page into React
//! component sources.
//!
//! ## Commands
//!
//! - `detect`: list the typed sections found in a page snapshot
//! - `generate`: run the full pipeline and write components to disk
//! - `normalize`: clean a markup fragment the way detection does
//! - `errors`: inspect persisted failed errors

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pagecraft_core::{
    format_error_line, normalize, DetectOptions, Detector, ErrorSummary, FailedErrorStore,
    PipelineError, RecoveryScheduler, RetryPolicy, SnapshotPage, StrategyKind,
};
use pagecraft_pipeline::{Pipeline, PipelineConfig, PipelineResult, ProgressUpdate};
use pagecraft_store::{FsOutputStore, JsonMetadataStore};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "pagecraft")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Turn a rendered landing page into React component sources", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect and type the sections of a page snapshot
    Detect {
        /// Page snapshot (JSON)
        snapshot: PathBuf,

        /// Maximum number of regions
        #[arg(long, default_value = "20")]
        max_regions: usize,

        /// Minimum region height in CSS pixels
        #[arg(long, default_value = "50")]
        min_height: f64,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Run the full pipeline and write component sources
    Generate {
        /// Page snapshot (JSON)
        snapshot: PathBuf,

        /// Pipeline configuration (TOML)
        #[arg(short, long, env = "PAGECRAFT_CONFIG")]
        config: Option<PathBuf>,

        /// Output directory for sources, metadata and screenshots
        #[arg(short, long, env = "PAGECRAFT_OUT_DIR", default_value = "pagecraft-out")]
        out_dir: PathBuf,

        /// Strategies to run (comma-separated: pixel,semantic,accessible)
        #[arg(short, long, value_delimiter = ',')]
        strategies: Vec<StrategyKind>,

        /// Skip screenshot capture
        #[arg(long)]
        no_screenshots: bool,

        /// Refine pixel-faithful output with the configured vision generator
        #[arg(long)]
        refine: bool,

        /// Retry recoverable errors once after the run
        #[arg(long)]
        recover: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Normalize a markup fragment (reads stdin when no file is given)
    Normalize {
        /// Markup file
        input: Option<PathBuf>,
    },

    /// Inspect persisted failed errors
    Errors {
        #[command(subcommand)]
        action: ErrorsAction,
    },
}

#[derive(Subcommand)]
enum ErrorsAction {
    /// List recorded errors, one line each
    List {
        /// Failed-error directory
        #[arg(short, long, env = "PAGECRAFT_FAILED_DIR", default_value = "pagecraft-out/failed")]
        dir: PathBuf,

        /// Restrict to one run
        #[arg(short, long)]
        run: Option<String>,
    },

    /// Counts by code, severity and owner
    Summary {
        /// Failed-error directory
        #[arg(short, long, env = "PAGECRAFT_FAILED_DIR", default_value = "pagecraft-out/failed")]
        dir: PathBuf,

        /// Restrict to one run
        #[arg(short, long)]
        run: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Delete the recorded errors of one run
    Clear {
        /// Failed-error directory
        #[arg(short, long, env = "PAGECRAFT_FAILED_DIR", default_value = "pagecraft-out/failed")]
        dir: PathBuf,

        /// Run to clear
        #[arg(short, long)]
        run: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    pagecraft_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Detect {
            snapshot,
            max_regions,
            min_height,
            format,
        } => {
            let options = DetectOptions {
                max_regions,
                min_height,
            };
            cmd_detect(&snapshot, options, format).await
        }
        Commands::Generate {
            snapshot,
            config,
            out_dir,
            strategies,
            no_screenshots,
            refine,
            recover,
            format,
        } => {
            let options = GenerateOptions {
                config,
                out_dir,
                strategies,
                no_screenshots,
                refine,
                recover,
            };
            let result = cmd_generate(&snapshot, &options).await?;
            print_result(&result, format)?;
            if result.success {
                Ok(())
            } else {
                anyhow::bail!("generation failed for {}", snapshot.display())
            }
        }
        Commands::Normalize { input } => cmd_normalize(input.as_deref()),
        Commands::Errors { action } => match action {
            ErrorsAction::List { dir, run } => cmd_errors_list(&dir, run.as_deref()),
            ErrorsAction::Summary { dir, run, format } => {
                cmd_errors_summary(&dir, run.as_deref(), format)
            }
            ErrorsAction::Clear { dir, run } => cmd_errors_clear(&dir, &run),
        },
    }
}

async fn load_snapshot(path: &Path) -> Result<SnapshotPage> {
    SnapshotPage::from_path(path)
        .await
        .with_context(|| format!("Failed to load page snapshot {:?}", path))
}

#[derive(Serialize)]
struct RegionRow {
    id: String,
    kind: String,
    order: usize,
    y: f64,
    height: f64,
}

async fn cmd_detect(snapshot: &Path, options: DetectOptions, format: Format) -> Result<()> {
    let page = load_snapshot(snapshot).await?;
    let detection = Detector::new()
        .detect(&page, options)
        .await
        .context("Section detection failed")?;

    let rows: Vec<RegionRow> = detection
        .regions
        .iter()
        .map(|r| RegionRow {
            id: r.id.clone(),
            kind: r.kind.to_string(),
            order: r.order,
            y: r.bounds.y,
            height: r.bounds.height,
        })
        .collect();

    match format {
        Format::Json => {
            let out = serde_json::json!({ "report": detection.report, "regions": rows });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Text => {
            println!(
                "Resolved by: {} (coverage {:.0}%)",
                detection.report.resolved_by,
                detection.report.coverage * 100.0
            );
            for row in &rows {
                println!(
                    "  {:>2}  {:<14} y={:<7.0} h={:.0}",
                    row.order, row.id, row.y, row.height
                );
            }
            println!();
            println!("Summary: {} regions", rows.len());
        }
    }
    Ok(())
}

struct GenerateOptions {
    config: Option<PathBuf>,
    out_dir: PathBuf,
    strategies: Vec<StrategyKind>,
    no_screenshots: bool,
    refine: bool,
    recover: bool,
}

/// Config file (or defaults) with CLI overrides applied. Unset directories
/// are placed under `out_dir`.
fn resolve_config(snapshot: &Path, options: &GenerateOptions) -> Result<PipelineConfig> {
    let mut config = match &options.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => PipelineConfig::default(),
    };

    config.source = snapshot.display().to_string();
    if options.config.is_none() || config.screenshot_dir == PipelineConfig::default().screenshot_dir
    {
        config.screenshot_dir = options.out_dir.join("screenshots");
    }
    if config.failed_error_dir.is_none() {
        config.failed_error_dir = Some(options.out_dir.join("failed"));
    }
    if !options.strategies.is_empty() {
        config.synthesis.strategies = options.strategies.clone();
    }
    if options.no_screenshots {
        config.capture_screenshots = false;
    }
    config.validate().context("Invalid pipeline configuration")?;
    Ok(config)
}

fn print_progress(update: ProgressUpdate) {
    match (update.current_item, update.total_items) {
        (Some(current), Some(total)) => eprintln!(
            "[{:>3}%] {}: {} ({}/{})",
            update.percent, update.phase, update.message, current, total
        ),
        _ => eprintln!("[{:>3}%] {}: {}", update.percent, update.phase, update.message),
    }
}

async fn cmd_generate(snapshot: &Path, options: &GenerateOptions) -> Result<PipelineResult> {
    let config = resolve_config(snapshot, options)?;
    let page = Arc::new(load_snapshot(snapshot).await?);
    let output = Arc::new(
        FsOutputStore::new(options.out_dir.join("sources"))
            .await
            .context("Failed to open output directory")?,
    );
    let metadata = Arc::new(
        JsonMetadataStore::new(options.out_dir.join("metadata"))
            .await
            .context("Failed to open metadata directory")?,
    );

    let pipeline = Pipeline::from_config(config, page, output, metadata)
        .context("Failed to set up pipeline")?;

    info!(snapshot = %snapshot.display(), out_dir = %options.out_dir.display(), "generating");
    let mut result = pipeline.run(&print_progress).await;

    if options.refine {
        match pipeline.refine(&mut result).await {
            Some(report) => info!(
                refined = report.refined,
                skipped = report.skipped,
                failed = report.failed.len(),
                "refinement complete"
            ),
            None => anyhow::bail!("--refine needs a [vision] section in the config"),
        }
    }

    if options.recover && !pipeline.errors().is_empty() {
        let scheduler = RecoveryScheduler::new(RetryPolicy::default());
        let report = pipeline.recover(&result, &scheduler).await;
        info!(
            attempted = report.attempted,
            recovered = report.recovered,
            failed = report.failed,
            "recovery sweep complete"
        );
    }

    Ok(result)
}

fn print_result(result: &PipelineResult, format: Format) -> Result<()> {
    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("Run ID: {}", result.run_id);
    println!("Status: {}", if result.success { "✓ SUCCESS" } else { "✗ FAILED" });
    println!("Duration: {}ms", result.duration_ms);
    println!();

    for component in &result.components {
        let status = if component.is_failed() { "✗" } else { "✓" };
        let strategies: Vec<&str> = component
            .variants()
            .iter()
            .map(|v| v.strategy.as_str())
            .collect();
        println!(
            "  {} {} [{}]",
            status,
            component.region_id,
            strategies.join(", ")
        );
    }

    if !result.errors.is_empty() {
        println!();
        println!("Errors:");
        for error in &result.errors {
            println!("  - {}", format_error_line(error));
        }
    }

    println!();
    println!(
        "Summary: {}/{} components generated",
        result.generated_count, result.detected_count
    );
    Ok(())
}

fn cmd_normalize(input: Option<&Path>) -> Result<()> {
    let markup = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read markup file {:?}", path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read markup from stdin")?;
            buf
        }
    };
    println!("{}", normalize(&markup));
    Ok(())
}

fn load_errors(dir: &Path, run: Option<&str>) -> Result<Vec<PipelineError>> {
    if !dir.exists() {
        anyhow::bail!("Failed-error directory not found: {:?}", dir);
    }
    let store = FailedErrorStore::new(dir)
        .with_context(|| format!("Failed to open failed-error directory {:?}", dir))?;
    let errors = match run {
        Some(run) => store.load_run(run),
        None => store.load_all(),
    }
    .context("Failed to read recorded errors")?;
    Ok(errors)
}

fn cmd_errors_list(dir: &Path, run: Option<&str>) -> Result<()> {
    let errors = load_errors(dir, run)?;
    if errors.is_empty() {
        println!("No recorded errors.");
        return Ok(());
    }
    for error in &errors {
        println!("{}  {}", error.timestamp.format("%Y-%m-%d %H:%M:%S"), format_error_line(error));
    }
    Ok(())
}

fn render_summary(summary: &ErrorSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Total: {} ({} recoverable)\n",
        summary.total, summary.recoverable
    ));
    if let Some(worst) = summary.worst() {
        out.push_str(&format!("Worst severity: {}\n", worst));
    }
    out.push_str("\nBy code:\n");
    for (code, count) in &summary.by_code {
        out.push_str(&format!("  {:<26} {}\n", code.as_str(), count));
    }
    out.push_str("\nBy owner:\n");
    for (owner, count) in &summary.by_owner {
        out.push_str(&format!("  {:<26} {}\n", owner, count));
    }
    out
}

fn cmd_errors_summary(dir: &Path, run: Option<&str>, format: Format) -> Result<()> {
    let errors = load_errors(dir, run)?;
    let summary = ErrorSummary::from_errors(&errors);
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        Format::Text => print!("{}", render_summary(&summary)),
    }
    Ok(())
}

fn cmd_errors_clear(dir: &Path, run: &str) -> Result<()> {
    let store = FailedErrorStore::new(dir)
        .with_context(|| format!("Failed to open failed-error directory {:?}", dir))?;
    store
        .clear_run(run)
        .with_context(|| format!("Failed to clear errors for run {}", run))?;
    println!("Cleared recorded errors for run {}", run);
    Ok(())
}
