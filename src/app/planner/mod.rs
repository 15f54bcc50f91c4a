// Clip planner - Loudness analysis and extraction window planning

use std::sync::Arc;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::worker_pool::run_bounded;
use crate::app::workspace::RunWorkspace;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules;
use crate::ports::*;

/// Planned jobs plus the number of candidates dropped for missing loudness
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPlan {
    pub jobs: Vec<ClipJob>,
    pub rejected: usize,
}

/// Turns retained candidates into clip jobs
pub struct ClipPlanner {
    probe_port: Arc<dyn ProbePort>,
    progress: Arc<dyn ProgressObserver>,
}

impl ClipPlanner {
    pub fn new(probe_port: Arc<dyn ProbePort>, progress: Arc<dyn ProgressObserver>) -> Self {
        Self {
            probe_port,
            progress,
        }
    }

    /// Measure loudness for each candidate, drop the unmeasurable ones, and
    /// plan a window for every survivor in input order
    pub async fn plan<R: Rng>(
        &self,
        candidates: Vec<InputCandidate>,
        jobs: usize,
        rng: &mut R,
        workspace: &RunWorkspace,
        cancel: &CancellationToken,
    ) -> Result<ClipPlan, DomainError> {
        info!(candidates = candidates.len(), "Analyzing loudness");

        let progress = Arc::clone(&self.progress);
        let analyzed = run_bounded(
            candidates,
            jobs,
            cancel,
            |done, total| progress.on_progress(ProgressStage::Analyzing, done, total),
            |mut candidate| {
                let probe = Arc::clone(&self.probe_port);
                let log = workspace.loudness_log(candidate.index);
                async move {
                    match probe.measure_loudness(&candidate.path, &log).await? {
                        Measured::Available(stats) => candidate.loudness = Some(stats),
                        Measured::Unavailable { reason, log } => warn!(
                            path = %candidate.path.display(),
                            reason = %reason,
                            log = ?log,
                            "Loudness analysis failed, skipping"
                        ),
                    }
                    Ok(candidate)
                }
            },
        )
        .await?;

        let mut planned = Vec::with_capacity(analyzed.len());
        let mut rejected = 0;
        for candidate in analyzed {
            let ordinal = planned.len();
            match Self::plan_job(candidate, ordinal, rng, workspace)? {
                Some(job) => planned.push(job),
                None => rejected += 1,
            }
        }

        info!(planned = planned.len(), rejected, "Planning finished");
        Ok(ClipPlan {
            jobs: planned,
            rejected,
        })
    }

    /// Plan one job. Returns `None` for a candidate without loudness stats.
    ///
    /// A candidate without a qualifying duration must never get here; that
    /// is an internal error rather than a skip.
    pub fn plan_job<R: Rng>(
        candidate: InputCandidate,
        ordinal: usize,
        rng: &mut R,
        workspace: &RunWorkspace,
    ) -> Result<Option<ClipJob>, DomainError> {
        let Some(loudness) = candidate.loudness else {
            return Ok(None);
        };
        let duration = candidate.duration.ok_or_else(|| {
            DomainError::InternalError(format!(
                "{} reached planning without a duration",
                candidate.path.display()
            ))
        })?;

        let start_offset = rules::draw_start_offset(rng, duration)?;
        debug!(
            path = %candidate.path.display(),
            ordinal,
            start_offset,
            duration,
            "Planned clip"
        );

        Ok(Some(ClipJob {
            ordinal,
            source: candidate.path,
            source_duration: duration,
            start_offset,
            length: rules::CLIP_LENGTH_SECS,
            loudness,
            output: workspace.segment_path(ordinal),
            log: workspace.segment_log(ordinal),
            state: JobState::Pending,
        }))
    }
}
