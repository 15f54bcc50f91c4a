// Encode coordinator - Common clip and per-clip re-encoding

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::worker_pool::run_bounded;
use crate::app::workspace::RunWorkspace;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Drives the processing engine for the shared clip and every planned job
pub struct EncodeCoordinator {
    engine_port: Arc<dyn EnginePort>,
    fs_port: Arc<dyn FsPort>,
    progress: Arc<dyn ProgressObserver>,
}

impl EncodeCoordinator {
    pub fn new(
        engine_port: Arc<dyn EnginePort>,
        fs_port: Arc<dyn FsPort>,
        progress: Arc<dyn ProgressObserver>,
    ) -> Self {
        Self {
            engine_port,
            fs_port,
            progress,
        }
    }

    /// Re-encode the first `fade` seconds of the common clip.
    ///
    /// Any failure here is fatal for the run.
    pub async fn encode_common_clip(
        &self,
        source: &Path,
        fade: FadeDuration,
        profile: &OutputProfile,
        workspace: &RunWorkspace,
        cancel: &CancellationToken,
    ) -> Result<CommonClipArtifact, DomainError> {
        let output = workspace.common_clip_path();
        let log = workspace.common_clip_log();
        let request = EncodeRequest::for_common_clip(source, fade, profile, &output);
        info!(path = %source.display(), fade = %fade, "Re-encoding common clip");

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DomainError::Cancelled),
            status = self.engine_port.encode(&request, &log) => status?,
        };

        let failed = || DomainError::CommonClipFailed {
            path: source.display().to_string(),
            log: log.display().to_string(),
        };
        if !status.is_success() {
            return Err(failed());
        }
        if !self.produced_artifact(&output).await? {
            warn!(path = %output.display(), "Common clip encode left no output");
            return Err(failed());
        }

        Ok(CommonClipArtifact { path: output })
    }

    /// Encode every job with at most `jobs` concurrent engine invocations.
    ///
    /// Each job comes back with its terminal state, in planning order.
    /// Per-job failures are recorded on the job; only engine unavailability
    /// or cancellation stop the stage.
    pub async fn encode_jobs(
        &self,
        planned: Vec<ClipJob>,
        fade: FadeDuration,
        profile: &OutputProfile,
        jobs: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<ClipJob>, DomainError> {
        info!(clips = planned.len(), jobs, "Encoding clips");

        let progress = Arc::clone(&self.progress);
        let finished = run_bounded(
            planned,
            jobs,
            cancel,
            |done, total| progress.on_progress(ProgressStage::Encoding, done, total),
            |mut job| {
                let engine = Arc::clone(&self.engine_port);
                let fs = Arc::clone(&self.fs_port);
                let request = EncodeRequest::for_segment(&job, fade, profile);
                async move {
                    job.state = match engine.encode(&request, &job.log).await? {
                        EngineStatus::Succeeded => match fs.file_size(&job.output).await? {
                            Some(size) if size > 0 => JobState::Succeeded,
                            _ => JobState::Failed {
                                reason: "encoder produced no output".to_string(),
                                log: job.log.clone(),
                            },
                        },
                        EngineStatus::Failed { exit_code } => JobState::Failed {
                            reason: match exit_code {
                                Some(code) => format!("encoder exited with status {}", code),
                                None => "encoder terminated by signal".to_string(),
                            },
                            log: job.log.clone(),
                        },
                    };
                    if let JobState::Failed { reason, log } = &job.state {
                        warn!(
                            path = %job.source.display(),
                            reason = %reason,
                            log = %log.display(),
                            "Failed to process clip"
                        );
                    }
                    Ok(job)
                }
            },
        )
        .await?;

        let succeeded = finished.iter().filter(|job| job.is_succeeded()).count();
        info!(
            succeeded,
            failed = finished.len() - succeeded,
            "Encoding finished"
        );
        Ok(finished)
    }

    async fn produced_artifact(&self, path: &Path) -> Result<bool, DomainError> {
        Ok(matches!(self.fs_port.file_size(path).await?, Some(size) if size > 0))
    }
}
