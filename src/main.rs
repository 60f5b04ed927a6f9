//! Censusdash - population census statistics
//!
//! A CLI tool that cleans a yearly census snapshot, computes demographic
//! indicators for a selected year and region (or compares years), and
//! writes a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Error (unreadable source, empty dataset, invalid selection, etc.)

use anyhow::{Context, Result};
use censusdash::cli::{Args, OutputFormat};
use censusdash::config::{Config, CONFIG_FILE};
use censusdash::dataset::Dataset;
use censusdash::ingest::{resolve_source, SnapshotCache};
use censusdash::query::{self, View};
use censusdash::report::{self, format_metric, format_number, Report, ReportMetadata};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Censusdash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .censusdash.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize data paths, the default selection, and output.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete workflow. Returns the exit code.
fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Step 1: Load and normalize the snapshot
    let source = resolve_source(&config.data_paths())?;
    if !args.quiet {
        println!("📥 Loading census snapshot: {}", source.display());
    }

    let mut cache = SnapshotCache::new();
    let dataset = cache.load_path(&source, !args.quiet)?;
    info!(
        "Loaded {} records from {} raw rows",
        dataset.len(),
        dataset.raw_rows
    );

    if args.list {
        print_listing(&dataset);
        return Ok(0);
    }

    // Step 2: Run the selection
    let selection = config.selection()?;
    debug!("Selection: {:?}", selection);
    let view = query::run(&dataset, &selection)?;

    // Step 3: Build and save the report
    let report = Report {
        metadata: ReportMetadata::for_dataset(&dataset),
        view,
    };

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = Path::new(&config.general.output);
    std::fs::write(output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    if let Some(ref export) = config.report.export {
        let export_path = Path::new(export);
        report::export_records(report.view.records(), export_path)
            .with_context(|| format!("Failed to export records to {}", export_path.display()))?;
        if !args.quiet {
            println!("💾 Exported selected records to: {}", export_path.display());
        }
    }

    if !args.quiet {
        print_summary(&report.view);
        println!(
            "\n✅ Done in {:.1}s. Report saved to: {}",
            start_time.elapsed().as_secs_f64(),
            output_path.display()
        );
    }

    Ok(0)
}

/// Print the headline numbers of a view.
fn print_summary(view: &View) {
    println!("\n📊 Summary:");
    match view {
        View::SingleYear(year_view) => {
            if year_view.is_empty() {
                println!("   No records match the current selection.");
                return;
            }
            let metrics = &year_view.metrics;
            println!("   Year: {}", year_view.year);
            println!("   Population: {}", format_number(metrics.total_population));
            println!(
                "   Male: {} | Female: {}",
                format_number(metrics.male),
                format_number(metrics.female)
            );
            println!(
                "   Dependency ratio: {}",
                format_metric(&metrics.dependency_ratio, |v| format!("{:.1}", v))
            );
        }
        View::Compare(comparison) => {
            if comparison.rows.is_empty() {
                println!("   No selected year is present in the dataset.");
                return;
            }
            for row in &comparison.rows {
                println!(
                    "   {}: {} ({})",
                    row.year,
                    format_number(row.total),
                    format_metric(&row.change_pct, |v| format!("{:+.1}%", v))
                );
            }
        }
    }
}

/// Print the available years, districts and subdistricts.
fn print_listing(dataset: &Dataset) {
    for year in dataset.years() {
        println!("{}", year);
        for district in dataset.districts(Some(year)) {
            let subdistricts = dataset.subdistricts(Some(year), Some(&district));
            println!("  {} ({})", district, subdistricts.join(", "));
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
