//! FFmpeg execution adapter
//!
//! This module drives the `ffmpeg` binary as the processing engine: one
//! re-encode per clip, one for the common clip, and a final stream-copy
//! concatenation through the concat demuxer.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// FFmpeg-based execution adapter
#[derive(Debug, Clone)]
pub struct FFmpegAdapter {
    program: PathBuf,
}

impl FFmpegAdapter {
    /// Create new FFmpeg adapter for the given binary
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl EnginePort for FFmpegAdapter {
    async fn check_available(&self) -> Result<(), DomainError> {
        check_tool(&self.program).await
    }

    async fn encode(
        &self,
        request: &EncodeRequest,
        log_path: &Path,
    ) -> Result<EngineStatus, DomainError> {
        run_logged(&self.program, encode_args(request), log_path).await
    }

    async fn concatenate(
        &self,
        plan: &AssemblyPlan,
        common: &CommonClipArtifact,
        manifest_path: &Path,
        output: &Path,
        log_path: &Path,
    ) -> Result<EngineStatus, DomainError> {
        let manifest = render_concat_manifest(&plan.resolve(common));
        tokio::fs::write(manifest_path, manifest)
            .await
            .map_err(|e| DomainError::fs("Failed to write concat manifest", e))?;

        run_logged(&self.program, concat_args(manifest_path, output), log_path).await
    }
}

/// Build the argument list for a trim + filter + re-encode invocation
pub fn encode_args(request: &EncodeRequest) -> Vec<OsString> {
    let profile = &request.profile;
    let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-y", "-ss"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(format_seconds(request.start).into());
    args.push("-t".into());
    args.push(format_seconds(request.length).into());
    args.push("-i".into());
    args.push(request.input.clone().into_os_string());
    args.push("-vf".into());
    args.push(video_filter(&request.video).into());
    if let Some(audio) = &request.audio {
        args.push("-af".into());
        args.push(loudnorm_filter(audio).into());
    }

    let encoding = [
        ("-r", profile.frame_rate.to_string()),
        ("-c:v", profile.video_codec.clone()),
        ("-preset", profile.preset.clone()),
        ("-crf", profile.crf.to_string()),
        ("-c:a", profile.audio_codec.clone()),
        ("-b:a", profile.audio_bitrate.clone()),
        ("-ar", profile.sample_rate.to_string()),
        ("-ac", profile.channels.to_string()),
        ("-pix_fmt", profile.pixel_format.clone()),
    ];
    for (flag, value) in encoding {
        args.push(flag.into());
        args.push(value.into());
    }
    if profile.faststart {
        args.push("-movflags".into());
        args.push("+faststart".into());
    }
    args.push(request.output.clone().into_os_string());
    args
}

/// Build the argument list for a stream-copy concatenation
pub fn concat_args(manifest_path: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-hide_banner",
        "-nostdin",
        "-y",
        "-f",
        "concat",
        "-safe",
        "0",
        "-i",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(manifest_path.as_os_str().to_os_string());
    args.push("-c".into());
    args.push("copy".into());
    args.push(output.as_os_str().to_os_string());
    args
}

/// Render the concat demuxer manifest, one quoted `file` line per entry
pub fn render_concat_manifest(paths: &[&Path]) -> String {
    paths
        .iter()
        .map(|path| {
            let escaped = path.to_string_lossy().replace('\'', "'\\''");
            format!("file '{}'\n", escaped)
        })
        .collect()
}

/// Render the scale and fade chain
pub fn video_filter(filters: &VideoFilters) -> String {
    let mut chain = vec![format!(
        "scale={}:{}",
        filters.scale.width, filters.scale.height
    )];
    chain.push(fade_filter(&filters.fade_in));
    if let Some(fade_out) = &filters.fade_out {
        chain.push(fade_filter(fade_out));
    }
    chain.join(",")
}

fn fade_filter(fade: &Fade) -> String {
    let direction = match fade.direction {
        FadeDirection::In => "in",
        FadeDirection::Out => "out",
    };
    format!(
        "fade=t={}:st={}:d={}",
        direction,
        format_seconds(fade.start),
        format_seconds(fade.duration)
    )
}

/// Render the second-pass loudnorm filter in linear mode
pub fn loudnorm_filter(normalization: &LoudnessNormalization) -> String {
    let target = &normalization.target;
    let measured = &normalization.measured;
    format!(
        concat!(
            "loudnorm=I={}:LRA={}:TP={}:",
            "measured_I={}:measured_LRA={}:measured_TP={}:",
            "measured_thresh={}:offset={}:linear=true:print_format=summary",
        ),
        target.integrated,
        target.range,
        target.true_peak,
        measured.integrated,
        measured.range,
        measured.true_peak,
        measured.threshold,
        measured.target_offset
    )
}

/// Render the analysis-only loudnorm filter
pub fn loudnorm_analysis_filter(target: &LoudnessTarget) -> String {
    format!(
        "loudnorm=I={}:LRA={}:TP={}:print_format=json",
        target.integrated, target.range, target.true_peak
    )
}

fn format_seconds(seconds: f64) -> String {
    format!("{}", seconds)
}

/// Map a failure to start a tool into a fatal error
pub(crate) fn spawn_error(program: &Path, err: std::io::Error) -> DomainError {
    DomainError::ToolUnavailable(format!("{}: {}", program.display(), err))
}

/// Check that `program -version` runs successfully
pub(crate) async fn check_tool(program: &Path) -> Result<(), DomainError> {
    let status = Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await
        .map_err(|e| spawn_error(program, e))?;

    if status.success() {
        Ok(())
    } else {
        Err(DomainError::ToolUnavailable(format!(
            "{} -version exited with {}",
            program.display(),
            status
        )))
    }
}

/// Run a tool with stdout discarded and stderr written to `log_path`
pub(crate) async fn run_logged(
    program: &Path,
    args: Vec<OsString>,
    log_path: &Path,
) -> Result<EngineStatus, DomainError> {
    let log_file = tokio::fs::File::create(log_path)
        .await
        .map_err(|e| DomainError::fs(&format!("Failed to create log {}", log_path.display()), e))?
        .into_std()
        .await;

    debug!(program = %program.display(), ?args, "Running engine");
    let status = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::from(log_file))
        .kill_on_drop(true)
        .status()
        .await
        .map_err(|e| spawn_error(program, e))?;

    if status.success() {
        Ok(EngineStatus::Succeeded)
    } else {
        Ok(EngineStatus::Failed {
            exit_code: status.code(),
        })
    }
}
