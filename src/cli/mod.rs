pub mod cleanup;
pub mod update;

use std::{io, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use update::{ImportMode, ImportReport, Pipeline};

use crate::{
    config::Config,
    ingest::{
        export_dir::ExportDirectory,
        strava::{StravaCredentials, StravaSource},
    },
    publish::GitPublisher,
    store::backup::backup_data_file,
    utils::{clock::DefaultClock, dir::ensure_dir, logging::enable_logging},
};

#[derive(Parser, Debug)]
#[command(name = "runtally", version, long_about = None)]
#[command(about = "Imports running activity exports into the training summary of the website")]
struct Args {
    #[command(subcommand)]
    commands: Option<Commands>,
    #[arg(long, help = "Print logs to the console")]
    log: bool,
    #[arg(long, help = "Directory with Garmin Connect exports")]
    exports: Option<PathBuf>,
    #[arg(long, help = "Summary document read by the website")]
    data: Option<PathBuf>,
    #[arg(long, help = "Directory for timestamped backups of the summary")]
    backups: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Backup, import new exports, commit and push, then offer to clean up")]
    Update,
    #[command(about = "Merge new exports into the summary")]
    Import,
    #[command(about = "Rebuild the summary from the export directory alone")]
    Rebuild,
    #[command(about = "Copy the summary into the backup directory")]
    Backup,
    #[command(about = "Fetch recent activities from Strava and merge them into the summary")]
    Strava {
        #[arg(long, default_value_t = 30, help = "Number of activities to request")]
        per_page: u32,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    // Logging goes first so configuration warnings end up in the log.
    let log_dir = Config::default().log_dir;
    ensure_dir(&log_dir).with_context(|| format!("Failed to create {log_dir:?}"))?;
    enable_logging(&log_dir, args.log)?;

    let config = Config::from_env()
        .with_exports_dir(args.exports)
        .with_data_file(args.data)
        .with_backup_dir(args.backups);

    let pipeline = Pipeline::new(&config, Arc::new(DefaultClock));
    let exports = ExportDirectory::new(config.exports_dir.clone());

    match args.commands.unwrap_or(Commands::Update) {
        Commands::Update => {
            let publisher = GitPublisher::new(config.repo_dir.clone());
            pipeline
                .update(
                    &exports,
                    &publisher,
                    config.backup_dir.clone(),
                    io::stdin().lock(),
                    io::stdout(),
                )
                .await?;
        }
        Commands::Import => {
            let report = pipeline.import(&exports, ImportMode::Incremental).await?;
            print_import(&report);
        }
        Commands::Rebuild => {
            let report = pipeline.import(&exports, ImportMode::Rebuild).await?;
            print_import(&report);
        }
        Commands::Backup => {
            match backup_data_file(pipeline.store(), &config.backup_dir, pipeline.clock()).await? {
                Some(v) => println!(
                    "Backup created: {} ({} runs, {}km)",
                    v.path.display(),
                    v.total_runs,
                    v.total_distance
                ),
                None => println!("Nothing to back up, {:?} doesn't exist", config.data_file),
            }
        }
        Commands::Strava { per_page } => {
            let source =
                StravaSource::new(StravaCredentials::from_env()?)?.with_page_size(per_page);
            let report = pipeline.import(&source, ImportMode::Incremental).await?;
            print_import(&report);
        }
    }
    info!("Done");
    Ok(())
}

fn print_import(report: &ImportReport) {
    println!(
        "{} records read: {} new, {} duplicates, {} skipped",
        report.records, report.admitted, report.duplicates, report.skipped
    );
    if report.saved {
        println!(
            "Total: {} runs | {}km",
            report.total_runs, report.total_distance
        );
    } else {
        println!("Data file unchanged");
    }
}
