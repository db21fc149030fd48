use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};

pub const DEFAULT_VOICE: &str = "onyx";
pub const DEFAULT_TTS_MODEL: &str = "tts-1";
pub const DEFAULT_PIPER_MODEL: &str = "./en_US-amy-medium.onnx";

/// Vertical band the captions are drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionPosition {
    #[default]
    Bottom,
    Top,
}

impl CaptionPosition {
    pub fn y(self) -> u32 {
        match self {
            CaptionPosition::Bottom => 1400,
            CaptionPosition::Top => 400,
        }
    }
}

/// Run-wide settings, read once from `config.json` and handed to each
/// component by reference.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub output_directory: PathBuf,
    #[serde(default = "default_temp_directory")]
    pub temp_directory: PathBuf,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_tts_model")]
    pub tts_model: String,
    #[serde(default = "default_piper_model")]
    pub piper_model: PathBuf,
    #[serde(default)]
    pub pexels_api_key: Option<String>,
    #[serde(default)]
    pub caption_position: CaptionPosition,
    #[serde(default)]
    pub font_file: Option<PathBuf>,
}

fn default_temp_directory() -> PathBuf {
    PathBuf::from("temp")
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_tts_model() -> String {
    DEFAULT_TTS_MODEL.to_string()
}

fn default_piper_model() -> PathBuf {
    PathBuf::from(DEFAULT_PIPER_MODEL)
}

impl Config {
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let data = fs::read_to_string(path).map_err(|e| {
            PipelineError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_json(&data)?;
        info!("Loaded configuration from {}", path.display());
        config.prepare_directories()?;
        Ok(config)
    }

    pub fn from_json(data: &str) -> PipelineResult<Self> {
        let mut config: Config = serde_json::from_str(data)
            .map_err(|e| PipelineError::configuration(format!("malformed config: {e}")))?;
        if config.output_directory.as_os_str().is_empty() {
            return Err(PipelineError::configuration("output_directory must not be empty"));
        }
        config.openai_api_key = non_empty(config.openai_api_key.take());
        config.pexels_api_key = non_empty(config.pexels_api_key.take());
        if config.voice.trim().is_empty() {
            config.voice = default_voice();
        }
        debug!(
            "Providers: cloud tts = {}, stock footage = {}",
            config.openai_api_key.is_some(),
            config.pexels_api_key.is_some()
        );
        Ok(config)
    }

    /// Creates the output and temp directories if they are missing.
    pub fn prepare_directories(&self) -> PipelineResult<()> {
        for dir in [&self.output_directory, &self.temp_directory] {
            fs::create_dir_all(dir).map_err(|e| {
                PipelineError::configuration(format!("cannot create {}: {e}", dir.display()))
            })?;
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
