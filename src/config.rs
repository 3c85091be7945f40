// Run configuration
// Every tunable the pipelines use. Passed by reference into each component so
// tests and config files can override any of them.

use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{MediaError, Result};

/// Stable frame analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    pub window_start_secs: f64,
    pub window_max_secs: f64,
    pub window_ratio: f64,
    pub sample_interval_secs: f64,
    pub burst_width: u32,
    pub burst_height: u32,
    pub burst_jpeg_q: u32,
    pub fallback_timestamp_secs: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_start_secs: constants::ANALYSIS_WINDOW_START_SECS,
            window_max_secs: constants::ANALYSIS_WINDOW_MAX_SECS,
            window_ratio: constants::ANALYSIS_WINDOW_RATIO,
            sample_interval_secs: constants::SAMPLE_INTERVAL_SECS,
            burst_width: constants::BURST_WIDTH,
            burst_height: constants::BURST_HEIGHT,
            burst_jpeg_q: constants::BURST_JPEG_Q,
            fallback_timestamp_secs: constants::FALLBACK_TIMESTAMP_SECS,
        }
    }
}

/// Poster (video thumbnail) output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PosterConfig {
    pub prefix: String,
    pub extension: String,
    pub target_width: u32,
    pub quality: u32,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            prefix: constants::POSTER_PREFIX.to_string(),
            extension: constants::POSTER_EXTENSION.to_string(),
            target_width: constants::POSTER_TARGET_WIDTH,
            quality: constants::POSTER_QUALITY,
        }
    }
}

/// Image to WebP conversion settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageConfig {
    pub extension: String,
    pub max_width: u32,
    pub quality: u32,
    pub source_extensions: Vec<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            extension: constants::IMAGE_OUTPUT_EXTENSION.to_string(),
            max_width: constants::IMAGE_MAX_WIDTH,
            quality: constants::IMAGE_QUALITY,
            source_extensions: constants::IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Web video compression settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoConfig {
    pub extension: String,
    pub max_height: u32,
    pub crf: u32,
    pub preset: String,
    pub audio_bitrate: String,
    pub source_extensions: Vec<String>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            extension: constants::VIDEO_OUTPUT_EXTENSION.to_string(),
            max_height: constants::VIDEO_MAX_HEIGHT,
            crf: constants::VIDEO_CRF,
            preset: constants::VIDEO_PRESET.to_string(),
            audio_bitrate: constants::VIDEO_AUDIO_BITRATE.to_string(),
            source_extensions: constants::VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Full run configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub poster: PosterConfig,
    pub image: ImageConfig,
    pub video: VideoConfig,
}

impl Config {
    /// Load a JSON config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipelines cannot work with.
    pub fn validate(&self) -> Result<()> {
        let a = &self.analysis;
        if !(a.sample_interval_secs > 0.0) {
            return Err(MediaError::Config("sampleIntervalSecs must be positive".to_string()));
        }
        if a.window_start_secs < 0.0 || a.window_max_secs < 0.0 {
            return Err(MediaError::Config("analysis window bounds must be non-negative".to_string()));
        }
        if !(0.0..=1.0).contains(&a.window_ratio) {
            return Err(MediaError::Config("windowRatio must be within 0..=1".to_string()));
        }
        if a.burst_width == 0 || a.burst_height == 0 || self.poster.target_width == 0 {
            return Err(MediaError::Config("frame sizes must be non-zero".to_string()));
        }
        if self.poster.prefix.is_empty() || self.poster.prefix.contains("--") {
            return Err(MediaError::Config("poster prefix must be non-empty and free of '--'".to_string()));
        }
        Ok(())
    }
}
