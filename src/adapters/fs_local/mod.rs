// Local filesystem adapter - Listing, existence checks and atomic commit

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::errors::*;
use crate::ports::*;

/// Local filesystem adapter
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFsAdapter;

impl LocalFsAdapter {
    /// Create new local filesystem adapter
    pub fn new() -> Self {
        Self
    }

    fn list_files_blocking(dir_path: &Path) -> Result<Vec<PathBuf>, DomainError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir_path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(DomainError::FsFail(format!(
                        "Failed to list {}: {}",
                        dir_path.display(),
                        e
                    )));
                }
                Err(e) => {
                    // Dangling links and unreadable entries are not candidates
                    warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            if entry.file_name().to_string_lossy().starts_with('.') {
                debug!(path = %entry.path().display(), "Skipping hidden file");
                continue;
            }
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Copy `from` next to `to` and rename it into place, so a failed copy
    /// never leaves a truncated file at `to`
    fn copy_into_place(from: &Path, to: &Path) -> Result<(), DomainError> {
        let parent = match to.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write_failed = |e| DomainError::fs(&format!("Failed to write {}", to.display()), e);

        let mut source = fs::File::open(from)
            .map_err(|e| DomainError::fs("Failed to open staged output", e))?;
        let mut staged = tempfile::Builder::new()
            .prefix(".powerhour-")
            .tempfile_in(parent)
            .map_err(write_failed)?;
        io::copy(&mut source, staged.as_file_mut()).map_err(write_failed)?;
        staged.as_file().sync_all().map_err(write_failed)?;
        staged.persist(to).map_err(|e| write_failed(e.error))?;

        fs::remove_file(from).map_err(|e| DomainError::fs("Failed to remove staged output", e))
    }

    fn copy_directory_blocking(from: &Path, to: &Path) -> Result<(), DomainError> {
        for entry in WalkDir::new(from) {
            let entry = entry.map_err(|e| {
                DomainError::FsFail(format!("Failed to read {}: {}", from.display(), e))
            })?;
            let relative = entry
                .path()
                .strip_prefix(from)
                .map_err(|e| DomainError::InternalError(e.to_string()))?;
            let target = to.join(relative);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)
                    .map_err(|e| DomainError::fs("Failed to create directory", e))?;
            } else {
                fs::copy(entry.path(), &target)
                    .map_err(|e| DomainError::fs("Failed to copy file", e))?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FsPort for LocalFsAdapter {
    async fn directory_exists(&self, dir_path: &Path) -> Result<bool, DomainError> {
        Ok(tokio::fs::metadata(dir_path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn file_exists(&self, file_path: &Path) -> Result<bool, DomainError> {
        Ok(tokio::fs::metadata(file_path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false))
    }

    async fn list_files(&self, dir_path: &Path) -> Result<Vec<PathBuf>, DomainError> {
        let dir = dir_path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::list_files_blocking(&dir))
            .await
            .map_err(|e| DomainError::InternalError(format!("listing task failed: {}", e)))?
    }

    async fn file_size(&self, file_path: &Path) -> Result<Option<u64>, DomainError> {
        match tokio::fs::metadata(file_path).await {
            Ok(metadata) if metadata.is_file() => Ok(Some(metadata.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DomainError::fs("Failed to stat file", e)),
        }
    }

    async fn commit_file(&self, from: &Path, to: &Path) -> Result<(), DomainError> {
        match tokio::fs::rename(from, to).await {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                // Rename fails across filesystems; fall back to copy + remove
                debug!(error = %rename_err, "Rename failed, copying output instead");
                let (from, to) = (from.to_path_buf(), to.to_path_buf());
                tokio::task::spawn_blocking(move || Self::copy_into_place(&from, &to))
                    .await
                    .map_err(|e| DomainError::InternalError(format!("commit task failed: {}", e)))?
            }
        }
    }

    async fn copy_directory(&self, from: &Path, to: &Path) -> Result<(), DomainError> {
        let (from, to) = (from.to_path_buf(), to.to_path_buf());
        tokio::task::spawn_blocking(move || Self::copy_directory_blocking(&from, &to))
            .await
            .map_err(|e| DomainError::InternalError(format!("copy task failed: {}", e)))?
    }
}
