use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "radar-accumulator")]
#[command(about = "Accumulates radar precipitation rasters into daily and weekly grids")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Hide progress bars")]
    pub quiet: bool,

    #[arg(short, long, global = true, help = "TOML settings file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Artifact directory (overrides settings)")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate the daily tier, then the weekly tier
    Run {
        #[arg(long, help = "Date of this run [default: today, UTC]")]
        today: Option<NaiveDate>,

        #[arg(long, help = "Keep raw rasters after their day is written")]
        keep_sources: bool,

        #[arg(long)]
        max_workers: Option<usize>,
    },

    /// Evaluate the daily tier only
    Daily {
        #[arg(long, help = "Keep raw rasters after their day is written")]
        keep_sources: bool,

        #[arg(long)]
        max_workers: Option<usize>,
    },

    /// Evaluate the weekly tier only
    Weekly {
        #[arg(long, help = "Date of this run [default: today, UTC]")]
        today: Option<NaiveDate>,
    },

    /// Convert one raster into an instant grid
    Convert {
        #[arg(short, long, help = "Input GeoTIFF raster")]
        input: PathBuf,

        #[arg(short, long, help = "Output grid path [default: next to the raster store]")]
        output: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Observation time, e.g. 2026-02-13T06:00:00 [default: from file name]"
        )]
        timestamp: Option<NaiveDateTime>,
    },

    /// Delete raw rasters already consumed by finished days
    Cleanup,

    /// Display information about a grid file
    Info {
        #[arg(short, long)]
        file: PathBuf,
    },
}
