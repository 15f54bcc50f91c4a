// Assembly sequencer - Interleave segments and commit the final file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::app::workspace::RunWorkspace;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

pub struct AssemblySequencer {
    engine_port: Arc<dyn EnginePort>,
    fs_port: Arc<dyn FsPort>,
}

impl AssemblySequencer {
    pub fn new(engine_port: Arc<dyn EnginePort>, fs_port: Arc<dyn FsPort>) -> Self {
        Self {
            engine_port,
            fs_port,
        }
    }

    /// Build the assembly plan from the successful jobs, in ordinal order
    pub fn plan(jobs: &[ClipJob]) -> Option<AssemblyPlan> {
        let segments = jobs
            .iter()
            .filter(|job| job.is_succeeded())
            .map(|job| SegmentArtifact {
                ordinal: job.ordinal,
                path: job.output.clone(),
            })
            .collect();
        AssemblyPlan::build(segments)
    }

    /// Concatenate into the workspace, then move the result to `output`.
    ///
    /// The destination is only touched once the concatenation has fully
    /// succeeded.
    pub async fn assemble(
        &self,
        jobs: &[ClipJob],
        common: &CommonClipArtifact,
        output: &Path,
        workspace: &RunWorkspace,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, DomainError> {
        let plan = Self::plan(jobs).ok_or(DomainError::NothingToAssemble)?;
        info!(
            segments = plan.segment_count(),
            entries = plan.len(),
            "Concatenating videos"
        );

        let staged = workspace.staged_output(output);
        let log = workspace.concat_log();
        let manifest = workspace.manifest_path();
        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DomainError::Cancelled),
            status = self.engine_port.concatenate(
                &plan,
                common,
                &manifest,
                &staged,
                &log,
            ) => status?,
        };

        let concat_failed = || DomainError::ConcatFailed {
            log: log.display().to_string(),
        };
        if !status.is_success() {
            return Err(concat_failed());
        }
        match self.fs_port.file_size(&staged).await? {
            Some(size) if size > 0 => {}
            _ => return Err(concat_failed()),
        }

        self.fs_port.commit_file(&staged, output).await?;
        info!(path = %output.display(), "Output written");
        Ok(output.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(ordinal: usize, state: JobState) -> ClipJob {
        ClipJob {
            ordinal,
            source: PathBuf::from(format!("/videos/{}.mp4", ordinal)),
            source_duration: 200.0,
            start_offset: 10,
            length: 60,
            loudness: LoudnessStats {
                integrated: -20.0,
                range: 5.0,
                true_peak: -1.0,
                threshold: -30.0,
                target_offset: 0.0,
            },
            output: PathBuf::from(format!("/work/segment_{:04}.mp4", ordinal)),
            log: PathBuf::from(format!("/work/logs/video_{:04}.log", ordinal)),
            state,
        }
    }

    fn failed() -> JobState {
        JobState::Failed {
            reason: "boom".to_string(),
            log: PathBuf::from("/work/logs/x.log"),
        }
    }

    #[test]
    fn test_plan_skips_failed_jobs() {
        let jobs = vec![
            job(0, JobState::Succeeded),
            job(1, failed()),
            job(2, JobState::Succeeded),
            job(3, failed()),
            job(4, JobState::Succeeded),
        ];
        let plan = AssemblySequencer::plan(&jobs).unwrap();
        assert_eq!(plan.segment_count(), 3);
        assert_eq!(plan.len(), 5);

        let common = CommonClipArtifact {
            path: PathBuf::from("/work/common_clip.mp4"),
        };
        let names: Vec<_> = plan
            .resolve(&common)
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "segment_0000.mp4",
                "common_clip.mp4",
                "segment_0002.mp4",
                "common_clip.mp4",
                "segment_0004.mp4",
            ]
        );
    }

    #[test]
    fn test_plan_empty_when_nothing_succeeded() {
        assert!(AssemblySequencer::plan(&[job(0, failed())]).is_none());
        assert!(AssemblySequencer::plan(&[]).is_none());
    }
}
