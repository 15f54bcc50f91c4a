// TOML config adapter - Configuration file loading

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::domain::errors::*;

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "powerhour.toml";

/// Run options that may be set from a config file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    pub max_videos: Option<usize>,
    pub jobs: Option<usize>,
    pub seed: Option<u64>,
    pub ffmpeg: Option<PathBuf>,
    pub ffprobe: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,
    pub keep_logs: Option<PathBuf>,
}

/// Encoder quality options
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingSection {
    pub preset: Option<String>,
    pub crf: Option<u8>,
    pub audio_bitrate: Option<String>,
}

/// Parsed configuration file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub powerhour: RunSection,
    pub encoding: EncodingSection,
}

/// TOML configuration adapter
#[derive(Debug, Default)]
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Create new TOML config adapter
    pub fn new() -> Self {
        Self
    }

    /// Load the explicit config file, or `powerhour.toml` from the working
    /// directory when present. Missing default file yields empty config.
    pub fn load(&self, explicit: Option<&Path>) -> Result<FileConfig, DomainError> {
        match explicit {
            Some(path) => self.load_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    self.load_file(default_path)
                } else {
                    Ok(FileConfig::default())
                }
            }
        }
    }

    /// Load and parse a specific config file
    pub fn load_file(&self, path: &Path) -> Result<FileConfig, DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content).map_err(|e| match e {
            DomainError::ConfigError(msg) => {
                DomainError::ConfigError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        info!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> Result<FileConfig, DomainError> {
        toml::from_str(content).map_err(|e| DomainError::ConfigError(e.to_string()))
    }
}
