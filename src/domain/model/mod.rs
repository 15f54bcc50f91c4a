// Domain models - Core types and data structures

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::errors::{DomainError, LoudnessParseError};
use crate::domain::rules;

/// Result of a measurement that is allowed to fail per file
#[derive(Debug, Clone, PartialEq)]
pub enum Measured<T> {
    /// The tool produced a usable value
    Available(T),
    /// The tool failed for this file; the candidate is dropped
    Unavailable {
        reason: String,
        log: Option<PathBuf>,
    },
}

impl<T> Measured<T> {
    /// Shorthand for an unavailable measurement without a log file
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Measured::Unavailable {
            reason: reason.into(),
            log: None,
        }
    }

    /// Convert into an `Option`, discarding the failure reason
    pub fn available(self) -> Option<T> {
        match self {
            Measured::Available(value) => Some(value),
            Measured::Unavailable { .. } => None,
        }
    }
}

/// Loudness statistics reported by the analysis pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoudnessStats {
    /// Integrated loudness (LUFS)
    pub integrated: f64,
    /// Loudness range (LU)
    pub range: f64,
    /// True peak (dBTP)
    pub true_peak: f64,
    /// Measured gating threshold (LUFS)
    pub threshold: f64,
    /// Offset gain suggested for the second pass (LU)
    pub target_offset: f64,
}

impl LoudnessStats {
    /// Parse the key/value report emitted by the analysis pass.
    ///
    /// Each line is split on its first colon; lines without a colon are
    /// ignored. Keys and values are stripped of surrounding whitespace,
    /// quotes and trailing commas, so both the JSON block and plain
    /// `key: value` lines are accepted. All five measurements must be present
    /// and finite.
    pub fn parse_report(report: &str) -> Result<Self, LoudnessParseError> {
        let mut fields: HashMap<String, String> = HashMap::new();
        for line in report.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            fields.insert(clean_report_token(key), clean_report_token(value));
        }

        let field = |name: &'static str| -> Result<f64, LoudnessParseError> {
            let raw = fields
                .get(name)
                .ok_or(LoudnessParseError::MissingField(name))?;
            match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                _ => Err(LoudnessParseError::InvalidValue {
                    field: name,
                    value: raw.clone(),
                }),
            }
        };

        Ok(Self {
            integrated: field("input_i")?,
            range: field("input_lra")?,
            true_peak: field("input_tp")?,
            threshold: field("input_thresh")?,
            target_offset: field("target_offset")?,
        })
    }
}

fn clean_report_token(token: &str) -> String {
    token
        .trim()
        .trim_end_matches(',')
        .trim()
        .trim_matches('"')
        .trim()
        .to_string()
}

/// Normalization targets handed to the loudness filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoudnessTarget {
    /// Integrated loudness target (LUFS)
    pub integrated: f64,
    /// Loudness range target (LU)
    pub range: f64,
    /// Maximum true peak (dBTP)
    pub true_peak: f64,
}

impl Default for LoudnessTarget {
    fn default() -> Self {
        Self {
            integrated: -23.0,
            range: 7.0,
            true_peak: -1.5,
        }
    }
}

/// A source file drawn from the input folder
#[derive(Debug, Clone, PartialEq)]
pub struct InputCandidate {
    /// Position in the random selection; used for log names
    pub index: usize,
    pub path: PathBuf,
    /// Measured container duration in seconds
    pub duration: Option<f64>,
    pub loudness: Option<LoudnessStats>,
}

impl InputCandidate {
    pub fn new(index: usize, path: PathBuf) -> Self {
        Self {
            index,
            path,
            duration: None,
            loudness: None,
        }
    }
}

/// Fade length applied to every clip boundary, validated on construction
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct FadeDuration(f64);

impl FadeDuration {
    /// Create a fade duration, rejecting values that do not fit the clip window
    pub fn new(seconds: f64) -> Result<Self, DomainError> {
        rules::validate_fade_duration(seconds)?;
        Ok(Self(seconds))
    }

    pub fn seconds(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for FadeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Outcome of a planned clip
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Pending,
    Succeeded,
    Failed { reason: String, log: PathBuf },
}

/// A planned unit of work: one window extracted from one source
#[derive(Debug, Clone, PartialEq)]
pub struct ClipJob {
    /// Stable position in planning order
    pub ordinal: usize,
    pub source: PathBuf,
    /// Measured duration of the source in seconds
    pub source_duration: f64,
    /// Window start in whole seconds
    pub start_offset: u32,
    /// Window length in whole seconds
    pub length: u32,
    pub loudness: LoudnessStats,
    /// Pre-allocated artifact path inside the workspace
    pub output: PathBuf,
    /// Pre-allocated diagnostic log path inside the workspace
    pub log: PathBuf,
    pub state: JobState,
}

impl ClipJob {
    /// Whether the window plus the trailing margin fits inside the source
    pub fn window_fits(&self) -> bool {
        f64::from(self.start_offset) + f64::from(self.length) + rules::EDGE_MARGIN_SECS as f64
            <= self.source_duration
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self.state, JobState::Succeeded)
    }
}

/// A segment that was encoded successfully
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentArtifact {
    pub ordinal: usize,
    pub path: PathBuf,
}

/// The re-encoded shared clip placed between segments
#[derive(Debug, Clone, PartialEq)]
pub struct CommonClipArtifact {
    pub path: PathBuf,
}

/// One entry of the final sequence
#[derive(Debug, Clone, PartialEq)]
pub enum AssemblyEntry {
    Segment(SegmentArtifact),
    CommonClip,
}

/// Ordered sequence handed to the concatenation step
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyPlan {
    entries: Vec<AssemblyEntry>,
}

impl AssemblyPlan {
    /// Interleave the common clip between consecutive segments.
    ///
    /// Segments are ordered by ordinal regardless of the order they are
    /// passed in. Returns `None` when there is nothing to assemble.
    pub fn build(mut segments: Vec<SegmentArtifact>) -> Option<Self> {
        if segments.is_empty() {
            return None;
        }
        segments.sort_by_key(|segment| segment.ordinal);

        let mut entries = Vec::with_capacity(segments.len() * 2 - 1);
        for (position, segment) in segments.into_iter().enumerate() {
            if position > 0 {
                entries.push(AssemblyEntry::CommonClip);
            }
            entries.push(AssemblyEntry::Segment(segment));
        }
        Some(Self { entries })
    }

    pub fn entries(&self) -> &[AssemblyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, AssemblyEntry::Segment(_)))
            .count()
    }

    /// Resolve every entry to a file path, in final order
    pub fn resolve<'a>(&'a self, common: &'a CommonClipArtifact) -> Vec<&'a Path> {
        self.entries
            .iter()
            .map(|entry| match entry {
                AssemblyEntry::Segment(segment) => segment.path.as_path(),
                AssemblyEntry::CommonClip => common.path.as_path(),
            })
            .collect()
    }
}

/// Output frame size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Fixed encoding parameters shared by every produced file.
///
/// Segments and the common clip must agree on all of these so the final
/// concatenation can stream-copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputProfile {
    pub resolution: Resolution,
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    pub frame_rate: u32,
    pub pixel_format: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub sample_rate: u32,
    pub channels: u32,
    pub faststart: bool,
}

impl Default for OutputProfile {
    fn default() -> Self {
        Self {
            resolution: Resolution {
                width: 1280,
                height: 720,
            },
            video_codec: "libx264".to_string(),
            preset: "medium".to_string(),
            crf: 23,
            frame_rate: 30,
            pixel_format: "yuv420p".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            sample_rate: 48_000,
            channels: 2,
            faststart: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    In,
    Out,
}

/// A video fade with explicit start and duration, relative to the window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    pub direction: FadeDirection,
    pub start: f64,
    pub duration: f64,
}

/// Video filter chain applied while re-encoding
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFilters {
    pub scale: Resolution,
    pub fade_in: Fade,
    pub fade_out: Option<Fade>,
}

/// Second-pass loudness normalization using measured statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessNormalization {
    pub target: LoudnessTarget,
    pub measured: LoudnessStats,
}

/// Everything the processing engine needs to produce one file
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeRequest {
    pub input: PathBuf,
    /// Trim window start in seconds
    pub start: f64,
    /// Trim window length in seconds
    pub length: f64,
    pub video: VideoFilters,
    pub audio: Option<LoudnessNormalization>,
    pub profile: OutputProfile,
    pub output: PathBuf,
}

impl EncodeRequest {
    /// Request for one planned clip: fade in at the window start, fade out
    /// ending at the window end, loudness normalized from its measurements
    pub fn for_segment(job: &ClipJob, fade: FadeDuration, profile: &OutputProfile) -> Self {
        let length = f64::from(job.length);
        let fade = fade.seconds();
        Self {
            input: job.source.clone(),
            start: f64::from(job.start_offset),
            length,
            video: VideoFilters {
                scale: profile.resolution,
                fade_in: Fade {
                    direction: FadeDirection::In,
                    start: 0.0,
                    duration: fade,
                },
                fade_out: Some(Fade {
                    direction: FadeDirection::Out,
                    start: (length - fade).max(0.0),
                    duration: fade,
                }),
            },
            audio: Some(LoudnessNormalization {
                target: LoudnessTarget::default(),
                measured: job.loudness,
            }),
            profile: profile.clone(),
            output: job.output.clone(),
        }
    }

    /// Request for the shared clip: its first `fade` seconds, fade in only
    pub fn for_common_clip(
        source: &Path,
        fade: FadeDuration,
        profile: &OutputProfile,
        output: &Path,
    ) -> Self {
        let fade = fade.seconds();
        Self {
            input: source.to_path_buf(),
            start: 0.0,
            length: fade,
            video: VideoFilters {
                scale: profile.resolution,
                fade_in: Fade {
                    direction: FadeDirection::In,
                    start: 0.0,
                    duration: fade,
                },
                fade_out: None,
            },
            audio: None,
            profile: profile.clone(),
            output: output.to_path_buf(),
        }
    }
}

/// Validated parameters for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub input_dir: PathBuf,
    pub common_clip: PathBuf,
    pub fade: FadeDuration,
    pub output: PathBuf,
    /// Upper bound on the number of sampled inputs
    pub max_videos: usize,
    /// Worker pool size for probes and encodes
    pub jobs: usize,
    /// Random seed; drawn from entropy when absent
    pub seed: Option<u64>,
    /// Parent directory for the run workspace
    pub temp_dir: Option<PathBuf>,
    /// Where to copy diagnostic logs before the workspace is removed
    pub keep_logs: Option<PathBuf>,
    pub profile: OutputProfile,
}

impl RunSettings {
    /// Settings with the reference defaults
    pub fn new(
        input_dir: impl Into<PathBuf>,
        common_clip: impl Into<PathBuf>,
        fade: FadeDuration,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            common_clip: common_clip.into(),
            fade,
            output: output.into(),
            max_videos: rules::DEFAULT_MAX_VIDEOS,
            jobs: 1,
            seed: None,
            temp_dir: None,
            keep_logs: None,
            profile: OutputProfile::default(),
        }
    }
}

/// Pipeline stage reported to progress observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProgressStage {
    /// Measuring durations
    Probing,
    /// Measuring loudness
    Analyzing,
    /// Encoding clips
    Encoding,
}

impl ProgressStage {
    pub fn label(&self) -> &'static str {
        match self {
            ProgressStage::Probing => "Checking durations",
            ProgressStage::Analyzing => "Analyzing loudness",
            ProgressStage::Encoding => "Processing",
        }
    }
}

/// A clip that was planned but failed to encode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedClip {
    pub ordinal: usize,
    pub source: PathBuf,
    pub reason: String,
    pub log: PathBuf,
}

/// Aggregate outcome of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub seed: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Files listed in the input folder
    pub files_found: usize,
    /// Files drawn by the random selection
    pub considered: usize,
    /// Dropped for being too short or failing the duration probe
    pub rejected_duration: usize,
    /// Dropped because loudness analysis was unavailable
    pub rejected_loudness: usize,
    pub planned: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<FailedClip>,
    pub output: Option<PathBuf>,
    pub abort_reason: Option<String>,
    pub preserved_logs: Option<PathBuf>,
}

impl RunReport {
    pub fn new(seed: u64, files_found: usize) -> Self {
        Self {
            seed,
            started_at: Utc::now(),
            finished_at: None,
            files_found,
            considered: 0,
            rejected_duration: 0,
            rejected_loudness: 0,
            planned: 0,
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
            output: None,
            abort_reason: None,
            preserved_logs: None,
        }
    }

    /// Record per-clip results from a finished encode stage
    pub fn record_jobs(&mut self, jobs: &[ClipJob]) {
        self.succeeded = jobs.iter().filter(|job| job.is_succeeded()).count();
        self.failures = jobs
            .iter()
            .filter_map(|job| match &job.state {
                JobState::Failed { reason, log } => Some(FailedClip {
                    ordinal: job.ordinal,
                    source: job.source.clone(),
                    reason: reason.clone(),
                    log: log.clone(),
                }),
                _ => None,
            })
            .collect();
        self.failed = self.failures.len();
    }

    /// Seal the report with the terminal outcome
    pub fn finish(&mut self, outcome: Result<PathBuf, DomainError>) {
        match outcome {
            Ok(output) => self.output = Some(output),
            Err(reason) => self.abort_reason = Some(reason.to_string()),
        }
        self.finished_at = Some(Utc::now());
    }

    pub fn is_success(&self) -> bool {
        self.output.is_some()
    }
}
