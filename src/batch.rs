use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::compose::{Composer, FfmpegRenderer, Renderer, output_path_for};
use crate::config::Config;
use crate::content::{ContentItem, Manifest};
use crate::error::{PipelineError, PipelineResult};
use crate::footage::{FootageSource, PexelsFootage};
use crate::subtitle::segment;
use crate::tts::{SpeechSynthesizer, synthesizer_for};
use crate::utils::timestamp_tag;

/// Outcome for one manifest entry, as written to the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GenerationResult {
    Success { title: String, path: PathBuf },
    Failed { title: String, error: String },
}

impl GenerationResult {
    pub fn title(&self) -> &str {
        match self {
            GenerationResult::Success { title, .. } | GenerationResult::Failed { title, .. } => {
                title
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success { .. })
    }
}

/// Runs manifests through voice-over, footage, captions, and export, one
/// item at a time.
pub struct VideoGenerator {
    config: Config,
    synthesizer: Box<dyn SpeechSynthesizer>,
    footage: Box<dyn FootageSource>,
    composer: Composer,
}

impl VideoGenerator {
    pub fn from_config(config: Config) -> Self {
        let synthesizer = synthesizer_for(&config);
        let footage = Box::new(PexelsFootage::from_config(&config));
        Self::with_parts(config, synthesizer, footage, Box::new(FfmpegRenderer))
    }

    pub fn with_parts(
        config: Config,
        synthesizer: Box<dyn SpeechSynthesizer>,
        footage: Box<dyn FootageSource>,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        let composer = Composer::new(renderer, &config);
        Self {
            config,
            synthesizer,
            footage,
            composer,
        }
    }

    pub fn create_video(&self, item: &ContentItem) -> PipelineResult<PathBuf> {
        info!("Generating video: {}", item.title);
        item.validate()?;

        let voice_path = self.config.temp_directory.join(format!(
            "voice_{}.{}",
            timestamp_tag(),
            self.synthesizer.extension()
        ));
        let audio = self.synthesizer.synthesize(&item.script, &voice_path)?;
        info!("Voice-over ready: {:.2}s", audio.duration);

        let footage = self.footage.fetch(&item.keyword, audio.duration)?;
        let captions = segment(&item.script, audio.duration);
        let output = output_path_for(&self.config.output_directory, &item.title);

        self.composer.compose(&footage, &audio, &captions, &output)
    }

    /// Processes every item in the manifest and writes the report. Only a
    /// manifest that cannot be loaded or a report that cannot be written
    /// fails the whole run.
    pub fn batch_generate(&self, manifest_path: &Path) -> PipelineResult<Vec<GenerationResult>> {
        let manifest = Manifest::load(manifest_path)?;
        let total = manifest.videos.len();

        let results: Vec<GenerationResult> = manifest
            .videos
            .iter()
            .enumerate()
            .map(|(i, item)| {
                info!("[{}/{}] {}", i + 1, total, item.title);
                match self.create_video(item) {
                    Ok(path) => GenerationResult::Success {
                        title: item.title.clone(),
                        path,
                    },
                    Err(e) => {
                        error!("Failed to create {}: {e}", item.title);
                        GenerationResult::Failed {
                            title: item.title.clone(),
                            error: e.to_string(),
                        }
                    }
                }
            })
            .collect();

        let report = self.write_report(&results)?;
        info!("Wrote batch report {}", report.display());
        Ok(results)
    }

    fn write_report(&self, results: &[GenerationResult]) -> PipelineResult<PathBuf> {
        let path = self
            .config
            .output_directory
            .join(format!("results_{}.json", timestamp_tag()));
        let data = serde_json::to_string_pretty(results).map_err(anyhow::Error::from)?;
        fs::write(&path, data).map_err(|e| {
            PipelineError::Io(std::io::Error::new(
                e.kind(),
                format!("cannot write report {}: {e}", path.display()),
            ))
        })?;
        Ok(path)
    }
}
