// Candidate selector - Random bounded sampling and duration filtering

use std::path::PathBuf;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::app::worker_pool::run_bounded;
use crate::app::workspace::RunWorkspace;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules;
use crate::ports::*;

/// Candidates that passed the duration filter, plus what was dropped
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub considered: usize,
    pub retained: Vec<InputCandidate>,
    pub rejected: usize,
}

/// Draws a bounded random subset of inputs and keeps the long-enough ones
pub struct CandidateSelector {
    probe_port: Arc<dyn ProbePort>,
    progress: Arc<dyn ProgressObserver>,
}

impl CandidateSelector {
    pub fn new(probe_port: Arc<dyn ProbePort>, progress: Arc<dyn ProgressObserver>) -> Self {
        Self {
            probe_port,
            progress,
        }
    }

    /// Uniformly sample `min(max_videos, files.len())` files without
    /// replacement, in random order
    pub fn sample<R: Rng>(
        files: &[PathBuf],
        max_videos: usize,
        rng: &mut R,
    ) -> Vec<InputCandidate> {
        let amount = rules::selection_size(files.len(), max_videos);
        let mut pool = files.to_vec();
        let (chosen, _) = pool.partial_shuffle(rng, amount);
        chosen
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, path)| InputCandidate::new(index, path))
            .collect()
    }

    /// Sample inputs and measure their durations, dropping any that are
    /// unmeasurable or shorter than the minimum
    pub async fn select<R: Rng>(
        &self,
        files: &[PathBuf],
        max_videos: usize,
        jobs: usize,
        rng: &mut R,
        workspace: &RunWorkspace,
        cancel: &CancellationToken,
    ) -> Result<Selection, DomainError> {
        let sampled = Self::sample(files, max_videos, rng);
        let considered = sampled.len();
        info!(considered, available = files.len(), "Checking durations");

        let progress = Arc::clone(&self.progress);
        let measured = run_bounded(
            sampled,
            jobs,
            cancel,
            |done, total| progress.on_progress(ProgressStage::Probing, done, total),
            |mut candidate| {
                let probe = Arc::clone(&self.probe_port);
                let log = workspace.duration_log(candidate.index);
                async move {
                    let measurement = probe.measure_duration(&candidate.path, &log).await?;
                    candidate.duration = measurement.available();
                    Ok(candidate)
                }
            },
        )
        .await?;

        let mut retained = Vec::with_capacity(measured.len());
        let mut rejected = 0;
        for candidate in measured {
            match candidate.duration {
                Some(duration) if rules::meets_duration_threshold(duration) => {
                    retained.push(candidate)
                }
                Some(duration) => {
                    debug!(path = %candidate.path.display(), duration, "Too short, skipping");
                    rejected += 1;
                }
                None => {
                    debug!(path = %candidate.path.display(), "Duration unavailable, skipping");
                    rejected += 1;
                }
            }
        }

        info!(retained = retained.len(), rejected, "Duration check finished");
        Ok(Selection {
            considered,
            retained,
            rejected,
        })
    }
}
