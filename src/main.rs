//! PowerHour CLI
//!
//! Assembles a power hour compilation from a folder of videos.
//!
//! # Usage
//!
//! ```bash
//! powerhour ./videos ./bell.mp4 1.5 party.mp4
//! powerhour ./videos ./bell.mp4 1.5 party.mp4 --jobs 4 --seed 42 --json
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use powerhour_cli::cli::{commands, Cli};
use powerhour_cli::utils::logging::init_tracing;

/// Main entry point for the PowerHour CLI application
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level, cli.log_format);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting PowerHour");
    commands::run(cli).await
}
