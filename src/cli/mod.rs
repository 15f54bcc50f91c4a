//! CLI module for PowerHour
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::Parser;
use clap_num::number_range;

use crate::utils::logging::{LogFormat, LogLevel};

pub mod commands;

fn parse_max_videos(s: &str) -> Result<usize, String> {
    number_range(s, 1, 10_000)
}

fn parse_jobs(s: &str) -> Result<usize, String> {
    number_range(s, 0, 256)
}

/// PowerHour compilation builder
///
/// Samples up to `--max-videos` files from a folder, cuts a random
/// loudness-normalized 60 second window from each, and joins them with a
/// short common clip between consecutive windows.
#[derive(Parser, Debug, Clone)]
#[command(name = "powerhour")]
#[command(about = "Assemble a power hour video from a folder of clips")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Folder containing the source videos
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Clip placed between consecutive segments
    #[arg(value_name = "COMMON_CLIP")]
    pub common_clip: PathBuf,

    /// Fade in/out duration in seconds (must be below 30)
    #[arg(value_name = "FADE_DURATION", allow_negative_numbers = true)]
    pub fade_duration: f64,

    /// Output file name
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Maximum number of source videos to sample [default: 60]
    #[arg(long, env = "POWERHOUR_MAX_VIDEOS", value_parser = parse_max_videos)]
    pub max_videos: Option<usize>,

    /// Concurrent probe/encode workers, 0 for one per CPU [default: 1]
    #[arg(short, long, env = "POWERHOUR_JOBS", value_parser = parse_jobs)]
    pub jobs: Option<usize>,

    /// Seed for selection and offsets; random when omitted
    #[arg(long, env = "POWERHOUR_SEED")]
    pub seed: Option<u64>,

    /// Path to the ffmpeg binary [default: ffmpeg]
    #[arg(long, env = "POWERHOUR_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,

    /// Path to the ffprobe binary [default: ffprobe]
    #[arg(long, env = "POWERHOUR_FFPROBE")]
    pub ffprobe: Option<PathBuf>,

    /// Parent directory for the temporary workspace
    #[arg(long, env = "POWERHOUR_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Copy diagnostic logs to this directory before cleanup
    #[arg(long, value_name = "DIR")]
    pub keep_logs: Option<PathBuf>,

    /// Configuration file [default: ./powerhour.toml when present]
    #[arg(long, value_name = "FILE", env = "POWERHOUR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Hide progress bars
    #[arg(short, long)]
    pub quiet: bool,
}
