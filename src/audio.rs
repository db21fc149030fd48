use hound::WavReader;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{PipelineError, PipelineResult};

/// A voice-over on disk. Owned by one pipeline run and removed after export.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAsset {
    pub path: PathBuf,
    pub duration: f64,
}

impl AudioAsset {
    pub fn from_file(path: impl Into<PathBuf>) -> PipelineResult<Self> {
        let path = path.into();
        let duration = audio_duration_seconds(&path)?;
        Ok(Self { path, duration })
    }
}

pub fn wav_duration_seconds(path: &Path) -> PipelineResult<f64> {
    let reader = WavReader::open(path)
        .map_err(|e| PipelineError::provider(format!("unreadable wav {}: {e}", path.display())))?;
    let spec = reader.spec();
    let samples = reader.len();
    let frames = samples as f64 / spec.channels as f64;
    Ok(frames / spec.sample_rate as f64)
}

/// Duration of any audio file: WAV is read directly, other containers go
/// through `ffprobe`.
pub fn audio_duration_seconds(path: &Path) -> PipelineResult<f64> {
    let is_wav = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
    if is_wav {
        wav_duration_seconds(path)
    } else {
        ffprobe_duration_seconds(path)
    }
}

pub fn ffprobe_duration_seconds(path: &Path) -> PipelineResult<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .map_err(|e| PipelineError::provider(format!("failed to run ffprobe: {e}")))?;
    if !output.status.success() {
        return Err(PipelineError::provider(format!(
            "ffprobe failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    parse_duration(&String::from_utf8_lossy(&output.stdout))
}

fn parse_duration(raw: &str) -> PipelineResult<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| PipelineError::provider(format!("unusable duration '{}'", raw.trim())))
}
