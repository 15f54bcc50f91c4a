//! Configuration initialization and hierarchy management

use tracing::{debug, info};

use crate::adapters::toml_config::{FileConfig, TomlConfigAdapter};
use crate::app::container::ToolPaths;
use crate::cli::Cli;
use crate::domain::errors::DomainError;
use crate::domain::model::{FadeDuration, OutputProfile, RunSettings};
use crate::domain::rules;

/// Highest CRF accepted by the H.264 encoder
const MAX_CRF: u8 = 51;

/// Fully resolved configuration for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub settings: RunSettings,
    pub tools: ToolPaths,
}

/// Resolve configuration following precedence: CLI > Env > File > Defaults.
///
/// Environment variables are folded into the CLI values by clap, so only the
/// file and the defaults are merged here.
pub fn initialize_configuration_hierarchy(cli: &Cli) -> Result<ResolvedConfig, DomainError> {
    let file = TomlConfigAdapter::new().load(cli.config.as_deref())?;
    let resolved = resolve(cli, file)?;
    info!(
        max_videos = resolved.settings.max_videos,
        jobs = resolved.settings.jobs,
        seed = ?resolved.settings.seed,
        ffmpeg = %resolved.tools.ffmpeg.display(),
        ffprobe = %resolved.tools.ffprobe.display(),
        "Configuration resolved"
    );
    Ok(resolved)
}

/// Merge parsed CLI values over a loaded config file
pub fn resolve(cli: &Cli, file: FileConfig) -> Result<ResolvedConfig, DomainError> {
    let run = file.powerhour;
    let encoding = file.encoding;

    let fade = FadeDuration::new(cli.fade_duration)?;

    let max_videos = cli
        .max_videos
        .or(run.max_videos)
        .unwrap_or(rules::DEFAULT_MAX_VIDEOS);
    if max_videos == 0 {
        return Err(DomainError::ConfigError(
            "max_videos must be at least 1".to_string(),
        ));
    }

    let jobs = match cli.jobs.or(run.jobs).unwrap_or(1) {
        0 => {
            let cpus = num_cpus::get();
            debug!(cpus, "Using one worker per CPU");
            cpus
        }
        n => n,
    };

    let mut profile = OutputProfile::default();
    if let Some(preset) = encoding.preset {
        profile.preset = preset;
    }
    if let Some(crf) = encoding.crf {
        if crf > MAX_CRF {
            return Err(DomainError::ConfigError(format!(
                "crf must be between 0 and {}, got {}",
                MAX_CRF, crf
            )));
        }
        profile.crf = crf;
    }
    if let Some(bitrate) = encoding.audio_bitrate {
        profile.audio_bitrate = bitrate;
    }

    let defaults = ToolPaths::default();
    let tools = ToolPaths {
        ffmpeg: cli.ffmpeg.clone().or(run.ffmpeg).unwrap_or(defaults.ffmpeg),
        ffprobe: cli.ffprobe.clone().or(run.ffprobe).unwrap_or(defaults.ffprobe),
    };

    let mut settings = RunSettings::new(
        cli.input_dir.clone(),
        cli.common_clip.clone(),
        fade,
        cli.output.clone(),
    );
    settings.max_videos = max_videos;
    settings.jobs = jobs;
    settings.seed = cli.seed.or(run.seed);
    settings.temp_dir = cli.temp_dir.clone().or(run.temp_dir);
    settings.keep_logs = cli.keep_logs.clone().or(run.keep_logs);
    settings.profile = profile;

    Ok(ResolvedConfig { settings, tools })
}
