// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for the external media-inspection tool.
///
/// Per-file failures come back as `Measured::Unavailable`; an `Err` means the
/// tool itself could not be run and the whole run must stop.
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Check that the inspection tools can be executed
    async fn check_available(&self) -> Result<(), DomainError>;

    /// Measure container duration in seconds
    async fn measure_duration(
        &self,
        file_path: &Path,
        log_path: &Path,
    ) -> Result<Measured<f64>, DomainError>;

    /// Run an analysis-only loudness pass
    async fn measure_loudness(
        &self,
        file_path: &Path,
        log_path: &Path,
    ) -> Result<Measured<LoudnessStats>, DomainError>;
}

/// Exit status of one engine invocation
#[derive(Debug, Clone, PartialEq)]
pub enum EngineStatus {
    Succeeded,
    Failed { exit_code: Option<i32> },
}

impl EngineStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, EngineStatus::Succeeded)
    }
}

/// Port for the external processing engine.
///
/// Diagnostics go to `log_path`. Futures returned here must terminate the
/// child process when dropped so that cancellation does not leak processes.
#[async_trait]
pub trait EnginePort: Send + Sync {
    /// Check that the engine can be executed
    async fn check_available(&self) -> Result<(), DomainError>;

    /// Trim, filter and re-encode one input
    async fn encode(
        &self,
        request: &EncodeRequest,
        log_path: &Path,
    ) -> Result<EngineStatus, DomainError>;

    /// Stream-copy concatenate the plan into `output`, writing the manifest
    /// to `manifest_path` first
    async fn concatenate(
        &self,
        plan: &AssemblyPlan,
        common: &CommonClipArtifact,
        manifest_path: &Path,
        output: &Path,
        log_path: &Path,
    ) -> Result<EngineStatus, DomainError>;
}

/// Port for file system operations
#[async_trait]
pub trait FsPort: Send + Sync {
    /// Check if directory exists
    async fn directory_exists(&self, dir_path: &Path) -> Result<bool, DomainError>;

    /// Check if regular file exists
    async fn file_exists(&self, file_path: &Path) -> Result<bool, DomainError>;

    /// List regular files directly inside `dir_path`, sorted by name
    async fn list_files(&self, dir_path: &Path) -> Result<Vec<PathBuf>, DomainError>;

    /// Size of a file in bytes, `None` if it does not exist
    async fn file_size(&self, file_path: &Path) -> Result<Option<u64>, DomainError>;

    /// Move a finished file into place, replacing any existing file
    async fn commit_file(&self, from: &Path, to: &Path) -> Result<(), DomainError>;

    /// Recursively copy a directory
    async fn copy_directory(&self, from: &Path, to: &Path) -> Result<(), DomainError>;
}

/// Observer notified as work items complete
pub trait ProgressObserver: Send + Sync {
    /// Called after each item of `stage` finishes, successfully or not
    fn on_progress(&self, stage: ProgressStage, completed: usize, total: usize);
}

/// Observer that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _stage: ProgressStage, _completed: usize, _total: usize) {}
}
