//! Configuration Management

use crate::normalize::NormalizeConfig;
use crate::segmentation::SegmenterConfig;
use crate::series::{LEFT_FORCE_CHANNEL, RIGHT_FORCE_CHANNEL};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Jump detection settings
    pub segmentation: SegmenterConfig,
    /// Time-normalization settings
    pub normalization: NormalizeConfig,
    /// Batch run settings
    pub batch: BatchSection,
}

/// Batch run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSection {
    /// Directory with one sub-directory of trial CSVs per participant
    pub data_dir: PathBuf,
    /// Directory for tables, normalized series, charts, and the summary
    pub output_dir: PathBuf,
    /// Participants to process
    pub participants: Vec<String>,
    /// Process participants on a worker pool
    pub parallel: bool,
    /// Render overview and ensemble charts
    pub render_charts: bool,
    /// Channels to render ensemble charts for
    pub chart_channels: Vec<String>,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data_final"),
            output_dir: PathBuf::from("jump_analysis_results"),
            participants: Vec::new(),
            parallel: true,
            render_charts: true,
            chart_channels: vec![
                LEFT_FORCE_CHANNEL.to_string(),
                RIGHT_FORCE_CHANNEL.to_string(),
            ],
        }
    }
}

impl Config {
    /// Validate config values at load time.
    ///
    /// Batch settings are checked where they are consumed (`run` needs a
    /// participant list, one-shot commands do not).
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.segmentation.validate()?;
        self.normalization.validate()?;
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &PathBuf) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from the default location, falling back to defaults
    /// when no file exists
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<(), crate::Error> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save to the default location
    pub fn save_default(&self) -> Result<(), crate::Error> {
        self.save(&Self::default_path())
    }

    /// Default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".jumplab").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}
