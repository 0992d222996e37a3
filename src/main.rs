use anyhow::Result;
use clap::{Parser, Subcommand};
use gonggo::harness::{HarnessOptions, run_harness};
use gonggo::pipeline::{DEFAULT_TIMEZONE, RunOptions, ValidateOptions, run_collection, validate_configs};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gonggo", about = "Incremental collector for public-sector support announcements")]
struct Cli {
    #[arg(long, default_value = "configs/sources")]
    config_dir: PathBuf,

    #[arg(long, default_value = "data/state/seen.json")]
    seen_path: PathBuf,

    #[arg(long, default_value = "data/state/details.json")]
    cache_path: PathBuf,

    #[arg(long, default_value = "data/snapshots")]
    snapshot_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_TIMEZONE)]
    timezone: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Collect {
        #[arg(long)]
        source: Option<String>,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    Validate {
        #[arg(long)]
        source_file: Option<PathBuf>,
    },
    Harness,
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Collect { source, dry_run } => {
            let summary = run_collection(&RunOptions {
                config_dir: cli.config_dir,
                seen_path: cli.seen_path,
                cache_path: cli.cache_path,
                snapshot_dir: cli.snapshot_dir,
                source,
                dry_run,
                timezone: cli.timezone,
            })?;

            for report in &summary.reports {
                info!(
                    source = %report.source_key,
                    pages = report.pages_fetched,
                    listed = report.items_listed,
                    deduped = report.title_deduped,
                    new = report.new_items,
                    details = report.details_fetched,
                    detail_failures = report.detail_failures,
                    halted = report.halted_on_error,
                    "source collection summary"
                );
            }
            info!(
                total = summary.records.len(),
                new = summary.new_records().len(),
                "collection complete"
            );
        }
        Commands::Validate { source_file } => {
            let messages = validate_configs(&ValidateOptions {
                config_dir: Some(cli.config_dir),
                source_file,
            })?;
            for line in messages {
                println!("{line}");
            }
        }
        Commands::Harness => {
            let report = run_harness(&HarnessOptions {
                config_dir: cli.config_dir,
                seen_path: cli.seen_path,
                cache_path: cli.cache_path,
                snapshot_dir: cli.snapshot_dir,
                timezone: cli.timezone,
            })?;

            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}
