//! Process-scoped temporary storage for one run
//!
//! Every intermediate artifact and diagnostic log lives under a single
//! temporary directory. The directory is removed when the workspace is
//! dropped, so every exit path (including unwinding) cleans up.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::domain::errors::DomainError;

const PREFIX: &str = "powerhour-";
const LOGS_DIR: &str = "logs";

/// Temporary directory plus a `logs/` subdirectory
#[derive(Debug)]
pub struct RunWorkspace {
    dir: TempDir,
    logs: PathBuf,
}

impl RunWorkspace {
    /// Create a workspace under `parent`, or the system temp dir
    pub fn create(parent: Option<&Path>) -> Result<Self, DomainError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(PREFIX);
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(|e| DomainError::fs("Failed to create workspace", e))?;

        let logs = dir.path().join(LOGS_DIR);
        std::fs::create_dir_all(&logs)
            .map_err(|e| DomainError::fs("Failed to create workspace log directory", e))?;

        debug!(path = %dir.path().display(), "Created workspace");
        Ok(Self { dir, logs })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs
    }

    pub fn duration_log(&self, index: usize) -> PathBuf {
        self.logs.join(format!("duration_{:04}.log", index))
    }

    pub fn loudness_log(&self, index: usize) -> PathBuf {
        self.logs.join(format!("loudness_{:04}.log", index))
    }

    pub fn segment_path(&self, ordinal: usize) -> PathBuf {
        self.root().join(format!("segment_{:04}.mp4", ordinal))
    }

    pub fn segment_log(&self, ordinal: usize) -> PathBuf {
        self.logs.join(format!("video_{:04}.log", ordinal))
    }

    pub fn common_clip_path(&self) -> PathBuf {
        self.root().join("common_clip.mp4")
    }

    pub fn common_clip_log(&self) -> PathBuf {
        self.logs.join("common_clip.log")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root().join("concat_list.txt")
    }

    pub fn concat_log(&self) -> PathBuf {
        self.logs.join("concat.log")
    }

    /// Path the concatenation writes to before it is committed. Keeps the
    /// requested extension so the engine picks the same container.
    pub fn staged_output(&self, final_output: &Path) -> PathBuf {
        let extension = final_output
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mp4".to_string());
        self.root().join(format!("output.{}", extension))
    }

    /// Remove the workspace now, reporting failures instead of ignoring them
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!(path = %path.display(), error = %e, "Failed to remove workspace");
        } else {
            debug!(path = %path.display(), "Removed workspace");
        }
    }
}
