//! Command implementations

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::container::{AppContainer, DefaultAppContainer};
use crate::cli::Cli;
use crate::config_initialization::initialize_configuration_hierarchy;
use crate::domain::model::RunReport;
use crate::utils::format_duration;

/// Execute a compilation run and print its report
pub async fn run(cli: Cli) -> Result<()> {
    let resolved = initialize_configuration_hierarchy(&cli)?;
    let container = DefaultAppContainer::new(&resolved.tools, !cli.quiet && !cli.json);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping workers");
            on_interrupt.cancel();
        }
    });

    let report = container
        .run_interactor()
        .execute(resolved.settings, cancel)
        .await?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        print_summary(&report);
    }

    match &report.abort_reason {
        None => Ok(()),
        Some(reason) => Err(anyhow!("{}", reason)),
    }
}

fn print_summary(report: &RunReport) {
    println!(
        "Processing complete. {} files failed to process.",
        report.failed
    );
    for failure in &report.failures {
        println!(
            "  Failed to process video: {} ({}). See {}",
            failure.source.display(),
            failure.reason,
            failure.log.display()
        );
    }

    let elapsed = report
        .finished_at
        .and_then(|finished| (finished - report.started_at).to_std().ok())
        .unwrap_or(Duration::ZERO);
    info!(
        seed = report.seed,
        considered = report.considered,
        planned = report.planned,
        succeeded = report.succeeded,
        elapsed = %format_duration(elapsed),
        "Run summary"
    );

    if let Some(output) = &report.output {
        println!(
            "Wrote {} ({} of {} clips, seed {}) in {}",
            output.display(),
            report.succeeded,
            report.planned,
            report.seed,
            format_duration(elapsed)
        );
    }
    if let Some(logs) = &report.preserved_logs {
        println!("Diagnostic logs kept in {}", logs.display());
    }
}
