use crate::analyzers::GridAnalyzer;
use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::processors::Pipeline;
use crate::settings::PipelineConfig;
use crate::utils::progress::ProgressReporter;
use crate::writers::GridWriter;
use chrono::{NaiveDate, Utc};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let mut config = PipelineConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let quiet = cli.quiet;

    match cli.command {
        Commands::Run {
            today,
            keep_sources,
            max_workers,
        } => {
            apply_overrides(&mut config, keep_sources, max_workers);
            let today = run_date(today);
            println!("Accumulating radar precipitation...");
            println!("Data directory: {}", config.data_dir.display());
            println!("Run date: {}", today);

            let report = tokio::task::spawn_blocking(move || {
                let pipeline = Pipeline::new(config)?;
                let progress = ProgressReporter::new(0, "Accumulating...", quiet);
                let report = pipeline.run(today, Some(&progress))?;
                progress.finish_with_message(&format!("Produced {} periods", report.produced.len()));
                Ok::<_, crate::error::ProcessingError>(report)
            })
            .await??;

            println!("\n{}", report.generate_summary());
        }

        Commands::Daily {
            keep_sources,
            max_workers,
        } => {
            apply_overrides(&mut config, keep_sources, max_workers);
            println!("Accumulating daily totals...");
            println!("Data directory: {}", config.data_dir.display());

            let report = tokio::task::spawn_blocking(move || {
                let pipeline = Pipeline::new(config)?;
                let progress = ProgressReporter::new(0, "Accumulating days...", quiet);
                let report = pipeline.run_daily(Some(&progress))?;
                progress.finish_with_message(&format!("Produced {} days", report.produced.len()));
                Ok::<_, crate::error::ProcessingError>(report)
            })
            .await??;

            println!("\n{}", report.generate_summary());
        }

        Commands::Weekly { today } => {
            let today = run_date(today);
            println!("Accumulating weekly totals...");
            println!("Data directory: {}", config.data_dir.display());

            let report = tokio::task::spawn_blocking(move || {
                let pipeline = Pipeline::new(config)?;
                let progress = ProgressReporter::new(0, "Accumulating weeks...", quiet);
                let report = pipeline.run_weekly(today, Some(&progress))?;
                progress.finish_with_message(&format!("Produced {} weeks", report.produced.len()));
                Ok::<_, crate::error::ProcessingError>(report)
            })
            .await??;

            println!("\n{}", report.generate_summary());
        }

        Commands::Convert {
            input,
            output,
            timestamp,
        } => {
            println!("Converting raster: {}", input.display());

            let path = tokio::task::spawn_blocking(move || {
                Pipeline::new(config)?.convert(&input, timestamp, output.as_deref())
            })
            .await??;

            let file_info = GridWriter::new().get_file_info(&path)?;
            println!("Wrote {}", path.display());
            println!("\n{}", file_info.summary());
        }

        Commands::Cleanup => {
            println!("Reclaiming consumed rasters in {}", config.data_dir.display());

            let outcome =
                tokio::task::spawn_blocking(move || Pipeline::new(config)?.cleanup()).await??;

            println!(
                "Deleted {} rasters, {} already absent",
                outcome.deleted.len(),
                outcome.already_absent.len()
            );
            if !outcome.failed.is_empty() {
                println!("Could not delete {} rasters:", outcome.failed.len());
                for (path, error) in &outcome.failed {
                    println!("  - {}: {}", path.display(), error);
                }
            }
        }

        Commands::Info { file } => {
            println!("Analyzing grid file: {}", file.display());

            let file_info = GridWriter::new().get_file_info(&file)?;
            let stats = GridAnalyzer::new().analyze_file(&file)?;

            println!("\n{}", stats.detailed_summary());
            println!("\nFile Details:");
            println!("{}", file_info.summary());
        }
    }

    Ok(())
}

/// Raster timestamps are UTC, so the default run date is the UTC day
fn run_date(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Utc::now().date_naive())
}

fn apply_overrides(config: &mut PipelineConfig, keep_sources: bool, max_workers: Option<usize>) {
    if keep_sources {
        config.delete_sources = false;
    }
    if let Some(workers) = max_workers {
        config.workers = workers;
    }
}

/// `RUST_LOG` wins over `--verbose`; logs go to stderr unless a file is given
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
