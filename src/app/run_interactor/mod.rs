// Run interactor - Orchestrates one end-to-end compilation run

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::coordinator::EncodeCoordinator;
use crate::app::planner::ClipPlanner;
use crate::app::selector::CandidateSelector;
use crate::app::sequencer::AssemblySequencer;
use crate::app::workspace::RunWorkspace;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules;
use crate::ports::*;

/// Interactor for the compilation use case
pub struct RunInteractor {
    probe_port: Arc<dyn ProbePort>,
    engine_port: Arc<dyn EnginePort>,
    fs_port: Arc<dyn FsPort>,
    selector: CandidateSelector,
    planner: ClipPlanner,
    coordinator: EncodeCoordinator,
    sequencer: AssemblySequencer,
}

impl RunInteractor {
    /// Create new run interactor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        engine_port: Arc<dyn EnginePort>,
        fs_port: Arc<dyn FsPort>,
        progress: Arc<dyn ProgressObserver>,
    ) -> Self {
        Self {
            selector: CandidateSelector::new(Arc::clone(&probe_port), Arc::clone(&progress)),
            planner: ClipPlanner::new(Arc::clone(&probe_port), Arc::clone(&progress)),
            coordinator: EncodeCoordinator::new(
                Arc::clone(&engine_port),
                Arc::clone(&fs_port),
                Arc::clone(&progress),
            ),
            sequencer: AssemblySequencer::new(Arc::clone(&engine_port), Arc::clone(&fs_port)),
            probe_port,
            engine_port,
            fs_port,
        }
    }

    /// Run the whole pipeline.
    ///
    /// Pre-flight failures return `Err` before any temporary storage exists.
    /// Once the workspace is created every outcome, including a fatal
    /// mid-run error or cancellation, comes back as a sealed `RunReport`.
    pub async fn execute(
        &self,
        settings: RunSettings,
        cancel: CancellationToken,
    ) -> Result<RunReport, DomainError> {
        let files = self.preflight(&settings).await?;

        let seed = settings.seed.unwrap_or_else(rand::random);
        info!(seed, files = files.len(), "Starting run");
        let mut report = RunReport::new(seed, files.len());
        let mut rng = StdRng::seed_from_u64(seed);

        let parent = settings.temp_dir.clone();
        let workspace =
            tokio::task::spawn_blocking(move || RunWorkspace::create(parent.as_deref()))
                .await
                .map_err(|e| {
                    DomainError::InternalError(format!("Workspace creation panicked: {}", e))
                })??;
        let mut outcome = self
            .run_stages(&settings, &files, &mut rng, &workspace, &cancel, &mut report)
            .await;

        if let Some(keep) = &settings.keep_logs {
            match self.preserve_logs(&workspace, keep).await {
                Ok(()) => {
                    relocate_logs(&mut report, &mut outcome, workspace.logs_dir(), keep);
                    report.preserved_logs = Some(keep.clone());
                }
                Err(e) => warn!(path = %keep.display(), error = %e, "Failed to preserve logs"),
            }
        }
        if let Err(e) = tokio::task::spawn_blocking(move || workspace.close()).await {
            warn!(error = %e, "Workspace cleanup task failed");
        }

        match &outcome {
            Ok(path) => info!(
                output = %path.display(),
                succeeded = report.succeeded,
                failed = report.failed,
                "Run finished"
            ),
            Err(e) => warn!(reason = %e, "Run aborted"),
        }
        report.finish(outcome);
        Ok(report)
    }

    /// Check every fatal pre-condition and return the selectable inputs
    async fn preflight(&self, settings: &RunSettings) -> Result<Vec<PathBuf>, DomainError> {
        if settings.max_videos == 0 {
            return Err(DomainError::BadArgs(
                "max videos must be at least 1".to_string(),
            ));
        }
        rules::validate_fade_duration(settings.fade.seconds())?;

        if !self.fs_port.directory_exists(&settings.input_dir).await? {
            return Err(DomainError::FileNotFound(format!(
                "Video folder does not exist: {}",
                settings.input_dir.display()
            )));
        }
        if !self.fs_port.file_exists(&settings.common_clip).await? {
            return Err(DomainError::FileNotFound(format!(
                "Common clip does not exist: {}",
                settings.common_clip.display()
            )));
        }
        if let Some(parent) = settings.output.parent() {
            if !parent.as_os_str().is_empty() && !self.fs_port.directory_exists(parent).await? {
                return Err(DomainError::FileNotFound(format!(
                    "Output directory does not exist: {}",
                    parent.display()
                )));
            }
        }

        let common = normalized(&settings.common_clip).await;
        let mut files = Vec::new();
        for file in self.fs_port.list_files(&settings.input_dir).await? {
            if normalized(&file).await == common {
                info!(path = %file.display(), "Excluding common clip from selection");
                continue;
            }
            files.push(file);
        }
        if files.is_empty() {
            return Err(DomainError::EmptyInput(
                settings.input_dir.display().to_string(),
            ));
        }

        self.probe_port.check_available().await?;
        self.engine_port.check_available().await?;
        Ok(files)
    }

    async fn run_stages(
        &self,
        settings: &RunSettings,
        files: &[PathBuf],
        rng: &mut StdRng,
        workspace: &RunWorkspace,
        cancel: &CancellationToken,
        report: &mut RunReport,
    ) -> Result<PathBuf, DomainError> {
        let selection = self
            .selector
            .select(files, settings.max_videos, settings.jobs, rng, workspace, cancel)
            .await?;
        report.considered = selection.considered;
        report.rejected_duration = selection.rejected;

        let plan = self
            .planner
            .plan(selection.retained, settings.jobs, rng, workspace, cancel)
            .await?;
        report.rejected_loudness = plan.rejected;
        report.planned = plan.jobs.len();

        let common = self
            .coordinator
            .encode_common_clip(
                &settings.common_clip,
                settings.fade,
                &settings.profile,
                workspace,
                cancel,
            )
            .await?;

        let finished = self
            .coordinator
            .encode_jobs(
                plan.jobs,
                settings.fade,
                &settings.profile,
                settings.jobs,
                cancel,
            )
            .await?;
        report.record_jobs(&finished);

        self.sequencer
            .assemble(&finished, &common, &settings.output, workspace, cancel)
            .await
    }

    async fn preserve_logs(
        &self,
        workspace: &RunWorkspace,
        keep: &Path,
    ) -> Result<(), DomainError> {
        self.fs_port.copy_directory(workspace.logs_dir(), keep).await?;
        info!(path = %keep.display(), "Preserved diagnostic logs");
        Ok(())
    }
}

async fn normalized(path: &Path) -> PathBuf {
    tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Point log references at the preserved copy instead of the workspace
fn relocate_logs(
    report: &mut RunReport,
    outcome: &mut Result<PathBuf, DomainError>,
    from: &Path,
    to: &Path,
) {
    let relocate = |path: &Path| match path.strip_prefix(from) {
        Ok(rest) => to.join(rest),
        Err(_) => path.to_path_buf(),
    };
    for failure in &mut report.failures {
        failure.log = relocate(&failure.log);
    }
    if let Err(e) = outcome {
        match e {
            DomainError::CommonClipFailed { log, .. } | DomainError::ConcatFailed { log } => {
                *log = relocate(Path::new(log.as_str())).display().to_string();
            }
            _ => {}
        }
    }
}
