use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{error, info};

use crate::audio::AudioAsset;
use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::openai::OpenAiClient;

/// Turns script text into a voice-over file. Failures are returned as-is;
/// retrying is the caller's decision.
pub trait SpeechSynthesizer {
    fn synthesize(&self, text: &str, dest: &Path) -> PipelineResult<AudioAsset>;

    /// File extension of the audio this provider writes.
    fn extension(&self) -> &'static str;
}

pub struct OpenAiSpeech {
    client: OpenAiClient,
    model: String,
    voice: String,
}

impl OpenAiSpeech {
    pub fn new(client: OpenAiClient, model: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            voice: voice.into(),
        }
    }
}

impl SpeechSynthesizer for OpenAiSpeech {
    fn synthesize(&self, text: &str, dest: &Path) -> PipelineResult<AudioAsset> {
        info!("Synthesizing {} chars with OpenAI voice '{}'", text.len(), self.voice);
        self.client.speech_to_file(&self.model, &self.voice, text, dest)?;
        AudioAsset::from_file(dest)
    }

    fn extension(&self) -> &'static str {
        "mp3"
    }
}

/// Local Piper voice. The engine runs as a child process awaited on a
/// private single-threaded runtime, so callers see a plain blocking call.
pub struct PiperSpeech {
    model: PathBuf,
}

impl PiperSpeech {
    pub fn new(model: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
        }
    }

    async fn run_piper(&self, text: &str, dest: &Path) -> PipelineResult<()> {
        let mut child = Command::new("piper")
            .arg("--model")
            .arg(&self.model)
            .arg("--output_file")
            .arg(dest)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| PipelineError::provider(format!("failed to spawn piper: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PipelineError::provider("failed to open piper stdin"))?;
        stdin.write_all(text.as_bytes()).await?;
        drop(stdin);

        let status = child.wait().await?;
        if !status.success() {
            error!("Piper TTS command failed for {}", dest.display());
            return Err(PipelineError::provider(format!(
                "piper exited with {status}"
            )));
        }
        Ok(())
    }
}

impl SpeechSynthesizer for PiperSpeech {
    fn synthesize(&self, text: &str, dest: &Path) -> PipelineResult<AudioAsset> {
        info!(
            "Synthesizing {} chars with Piper model {}",
            text.len(),
            self.model.display()
        );
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run_piper(text, dest))?;
        AudioAsset::from_file(dest)
    }

    fn extension(&self) -> &'static str {
        "wav"
    }
}

/// Cloud speech when an OpenAI key is configured, Piper otherwise.
pub fn synthesizer_for(config: &Config) -> Box<dyn SpeechSynthesizer> {
    match &config.openai_api_key {
        Some(key) => {
            info!("Using OpenAI speech (voice '{}')", config.voice);
            Box::new(OpenAiSpeech::new(
                OpenAiClient::new(key.clone()),
                config.tts_model.clone(),
                config.voice.clone(),
            ))
        }
        None => {
            info!("No OpenAI key configured, using local Piper voice");
            Box::new(PiperSpeech::new(config.piper_model.clone()))
        }
    }
}
