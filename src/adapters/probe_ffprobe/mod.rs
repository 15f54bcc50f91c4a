//! FFprobe adapter for media file measurement
//!
//! Durations come from `ffprobe`; loudness statistics come from an
//! analysis-only `ffmpeg` pass with the loudnorm filter, which writes its
//! report to stderr and produces no media output.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::adapters::exec_ffmpeg::{check_tool, loudnorm_analysis_filter, spawn_error};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// FFprobe-based probe adapter
#[derive(Debug, Clone)]
pub struct FFprobeAdapter {
    ffprobe: PathBuf,
    ffmpeg: PathBuf,
    target: LoudnessTarget,
}

impl FFprobeAdapter {
    /// Create new probe adapter for the given binaries
    pub fn new(ffprobe: impl Into<PathBuf>, ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
            ffmpeg: ffmpeg.into(),
            target: LoudnessTarget::default(),
        }
    }

    async fn capture(&self, program: &Path, command: &mut Command) -> Result<Output, DomainError> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| spawn_error(program, e))
    }
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn check_available(&self) -> Result<(), DomainError> {
        check_tool(&self.ffprobe).await?;
        check_tool(&self.ffmpeg).await
    }

    async fn measure_duration(
        &self,
        file_path: &Path,
        log_path: &Path,
    ) -> Result<Measured<f64>, DomainError> {
        let mut command = Command::new(&self.ffprobe);
        command
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(file_path);
        let output = self.capture(&self.ffprobe, &mut command).await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if output.status.success() {
            if let Some(duration) = parse_duration(&stdout) {
                debug!(path = %file_path.display(), duration, "Measured duration");
                return Ok(Measured::Available(duration));
            }
        }

        write_log(log_path, &output).await?;
        let reason = if output.status.success() {
            format!("unreadable duration '{}'", stdout.trim())
        } else {
            format!("ffprobe exited with {}", output.status)
        };
        Ok(Measured::Unavailable {
            reason,
            log: Some(log_path.to_path_buf()),
        })
    }

    async fn measure_loudness(
        &self,
        file_path: &Path,
        log_path: &Path,
    ) -> Result<Measured<LoudnessStats>, DomainError> {
        let filter = loudnorm_analysis_filter(&self.target);
        let mut command = Command::new(&self.ffmpeg);
        command
            .args(["-hide_banner", "-nostats", "-nostdin", "-i"])
            .arg(file_path)
            .args(["-af", filter.as_str(), "-f", "null", "-"]);
        let output = self.capture(&self.ffmpeg, &mut command).await?;

        if !output.status.success() {
            write_log(log_path, &output).await?;
            return Ok(Measured::Unavailable {
                reason: format!("loudness analysis exited with {}", output.status),
                log: Some(log_path.to_path_buf()),
            });
        }

        let report = String::from_utf8_lossy(&output.stderr);
        match LoudnessStats::parse_report(&report) {
            Ok(stats) => Ok(Measured::Available(stats)),
            Err(e) => {
                write_log(log_path, &output).await?;
                Ok(Measured::Unavailable {
                    reason: e.to_string(),
                    log: Some(log_path.to_path_buf()),
                })
            }
        }
    }
}

/// Parse the plain numeric duration printed by ffprobe
pub fn parse_duration(text: &str) -> Option<f64> {
    let duration = text.trim().parse::<f64>().ok()?;
    (duration.is_finite() && duration > 0.0).then_some(duration)
}

async fn write_log(log_path: &Path, output: &Output) -> Result<(), DomainError> {
    let mut contents = output.stderr.clone();
    contents.extend_from_slice(&output.stdout);
    tokio::fs::write(log_path, contents)
        .await
        .map_err(|e| DomainError::fs(&format!("Failed to write log {}", log_path.display()), e))
}
