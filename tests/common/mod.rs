//! Fake ports and fixtures shared by the pipeline tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use powerhour_cli::adapters::LocalFsAdapter;
use powerhour_cli::app::RunInteractor;
use powerhour_cli::domain::errors::DomainError;
use powerhour_cli::domain::model::*;
use powerhour_cli::ports::*;

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn stats() -> LoudnessStats {
    LoudnessStats {
        integrated: -19.5,
        range: 6.2,
        true_peak: -0.8,
        threshold: -29.9,
        target_offset: 0.3,
    }
}

/// Probe answering from a table of durations keyed by file name
#[derive(Default)]
pub struct FakeProbe {
    pub durations: HashMap<String, f64>,
    pub loudness_failures: HashSet<String>,
    pub unavailable: bool,
}

impl FakeProbe {
    pub fn with_durations(durations: &[(&str, f64)]) -> Self {
        Self {
            durations: durations
                .iter()
                .map(|(name, seconds)| (name.to_string(), *seconds))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing_loudness(mut self, name: &str) -> Self {
        self.loudness_failures.insert(name.to_string());
        self
    }
}

#[async_trait]
impl ProbePort for FakeProbe {
    async fn check_available(&self) -> Result<(), DomainError> {
        if self.unavailable {
            return Err(DomainError::ToolUnavailable("ffprobe".to_string()));
        }
        Ok(())
    }

    async fn measure_duration(
        &self,
        file_path: &Path,
        _log_path: &Path,
    ) -> Result<Measured<f64>, DomainError> {
        Ok(match self.durations.get(&file_name(file_path)) {
            Some(seconds) => Measured::Available(*seconds),
            None => Measured::unavailable("no duration"),
        })
    }

    async fn measure_loudness(
        &self,
        file_path: &Path,
        log_path: &Path,
    ) -> Result<Measured<LoudnessStats>, DomainError> {
        if self.loudness_failures.contains(&file_name(file_path)) {
            std::fs::write(log_path, "loudnorm failed").map_err(|e| DomainError::fs("log", e))?;
            return Ok(Measured::Unavailable {
                reason: "analysis failed".to_string(),
                log: Some(log_path.to_path_buf()),
            });
        }
        Ok(Measured::Available(stats()))
    }
}

/// Engine that writes the source name into every produced file.
///
/// Concatenation joins the contents of the resolved plan, so the final output
/// lists the sources in assembly order, one per line.
#[derive(Default)]
pub struct FakeEngine {
    pub failing_sources: HashSet<String>,
    /// Delay encodes so that higher ordinals finish first
    pub reverse_completion: bool,
    pub fail_concat: bool,
    pub encodes: Mutex<Vec<EncodeRequest>>,
    pub concat_calls: Mutex<usize>,
}

impl FakeEngine {
    pub fn failing(names: &[&str]) -> Self {
        Self {
            failing_sources: names.iter().map(|name| name.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn encode_count(&self) -> usize {
        self.encodes.lock().unwrap().len()
    }

    pub fn concat_count(&self) -> usize {
        *self.concat_calls.lock().unwrap()
    }

    pub fn segment_requests(&self) -> Vec<EncodeRequest> {
        self.encodes
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.audio.is_some())
            .cloned()
            .collect()
    }
}

fn ordinal_of(output: &Path) -> u64 {
    file_name(output)
        .trim_start_matches("segment_")
        .trim_end_matches(".mp4")
        .parse()
        .unwrap_or(0)
}

#[async_trait]
impl EnginePort for FakeEngine {
    async fn check_available(&self) -> Result<(), DomainError> {
        Ok(())
    }

    async fn encode(
        &self,
        request: &EncodeRequest,
        log_path: &Path,
    ) -> Result<EngineStatus, DomainError> {
        self.encodes.lock().unwrap().push(request.clone());
        if self.reverse_completion && request.audio.is_some() {
            let ordinal = ordinal_of(&request.output);
            tokio::time::sleep(Duration::from_millis(60u64.saturating_sub(ordinal * 10))).await;
        }

        let source = file_name(&request.input);
        if self.failing_sources.contains(&source) {
            std::fs::write(log_path, format!("failed to encode {}", source))
                .map_err(|e| DomainError::fs("log", e))?;
            return Ok(EngineStatus::Failed { exit_code: Some(1) });
        }
        std::fs::write(&request.output, &source).map_err(|e| DomainError::fs("encode", e))?;
        Ok(EngineStatus::Succeeded)
    }

    async fn concatenate(
        &self,
        plan: &AssemblyPlan,
        common: &CommonClipArtifact,
        _manifest_path: &Path,
        output: &Path,
        log_path: &Path,
    ) -> Result<EngineStatus, DomainError> {
        *self.concat_calls.lock().unwrap() += 1;
        if self.fail_concat {
            std::fs::write(log_path, "concat failed").map_err(|e| DomainError::fs("log", e))?;
            return Ok(EngineStatus::Failed { exit_code: Some(1) });
        }
        let mut lines = Vec::new();
        for path in plan.resolve(common) {
            lines.push(std::fs::read_to_string(path).map_err(|e| DomainError::fs("read", e))?);
        }
        std::fs::write(output, lines.join("\n")).map_err(|e| DomainError::fs("concat", e))?;
        Ok(EngineStatus::Succeeded)
    }
}

/// On-disk layout for one test run
pub struct Fixture {
    pub root: TempDir,
    pub input_dir: PathBuf,
    pub common_clip: PathBuf,
    pub output: PathBuf,
    pub scratch: PathBuf,
}

impl Fixture {
    pub fn new(inputs: &[&str]) -> Self {
        let root = TempDir::new().unwrap();
        let input_dir = root.path().join("videos");
        let scratch = root.path().join("scratch");
        std::fs::create_dir_all(&input_dir).unwrap();
        std::fs::create_dir_all(&scratch).unwrap();
        for name in inputs {
            std::fs::write(input_dir.join(name), b"video").unwrap();
        }
        let common_clip = root.path().join("bell.mp4");
        std::fs::write(&common_clip, b"bell").unwrap();
        let output = root.path().join("party.mp4");
        Self {
            root,
            input_dir,
            common_clip,
            output,
            scratch,
        }
    }

    pub fn settings(&self, fade: f64) -> RunSettings {
        let mut settings = RunSettings::new(
            &self.input_dir,
            &self.common_clip,
            FadeDuration::new(fade).unwrap(),
            &self.output,
        );
        settings.temp_dir = Some(self.scratch.clone());
        settings.seed = Some(7);
        settings
    }

    /// Lines of the produced output, in assembly order
    pub fn output_lines(&self) -> Vec<String> {
        std::fs::read_to_string(&self.output)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn scratch_is_empty(&self) -> bool {
        std::fs::read_dir(&self.scratch).unwrap().count() == 0
    }
}

pub fn interactor(probe: Arc<FakeProbe>, engine: Arc<FakeEngine>) -> RunInteractor {
    RunInteractor::new(
        probe,
        engine,
        Arc::new(LocalFsAdapter::new()),
        Arc::new(NoProgress),
    )
}
