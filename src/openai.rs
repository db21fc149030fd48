use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Thin blocking client for the two OpenAI endpoints this crate calls.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, OPENAI_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Synthesizes `input` and streams the audio body into `dest`.
    pub fn speech_to_file(
        &self,
        model: &str,
        voice: &str,
        input: &str,
        dest: &Path,
    ) -> PipelineResult<()> {
        let url = format!("{}/audio/speech", self.base_url);
        debug!("POST {url} (voice {voice}, {} chars)", input.len());
        let mut res = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&SpeechRequest {
                model,
                voice,
                input,
            })
            .send()?
            .error_for_status()?;
        let mut file = File::create(dest)?;
        res.copy_to(&mut file)?;
        Ok(())
    }

    pub fn chat(
        &self,
        model: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> PipelineResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("POST {url} (model {model})");
        let res: ChatResponse = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
                max_tokens,
                temperature,
            })
            .send()?
            .error_for_status()?
            .json()?;

        res.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PipelineError::provider("chat completion returned no content"))
    }
}
