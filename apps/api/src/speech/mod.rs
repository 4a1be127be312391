//! Speech-to-text proxy. Keeps the ElevenLabs key server-side.

pub mod handlers;

use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub const ELEVENLABS_STT_URL: &str = "https://api.elevenlabs.io/v1/speech-to-text";
const STT_MODEL_ID: &str = "scribe_v2";
const STT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("ElevenLabs API key not configured. Add ELEVENLABS_API_KEY to the environment and restart the server.")]
    MissingKey,

    #[error("ElevenLabs API key is empty. Set ELEVENLABS_API_KEY to a valid key.")]
    EmptyKey,

    #[error("Failed to connect to ElevenLabs API: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ElevenLabs API error: {message}")]
    Upstream { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// An uploaded recording.
pub struct AudioUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Clone)]
pub struct SpeechToTextClient {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

impl SpeechToTextClient {
    pub fn new(api_key: Option<String>, endpoint: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(STT_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            endpoint,
        }
    }

    pub async fn transcribe(&self, audio: AudioUpload) -> Result<String, SpeechError> {
        let api_key = match self.api_key.as_deref() {
            None => return Err(SpeechError::MissingKey),
            Some(key) if key.trim().is_empty() => return Err(SpeechError::EmptyKey),
            Some(key) => key,
        };

        let part = Part::bytes(audio.data.to_vec())
            .file_name(audio.file_name)
            .mime_str(&audio.content_type)?;
        let form = Form::new()
            .part("file", part)
            .text("model_id", STT_MODEL_ID);

        let response = self
            .client
            .post(&self.endpoint)
            .header("xi-api-key", api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let is_json = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.starts_with("application/json"));
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Upstream {
                status: status.as_u16(),
                message: upstream_detail(&body, is_json),
            });
        }

        let transcription: TranscriptionResponse = response.json().await?;
        Ok(transcription.text)
    }
}

fn upstream_detail(body: &str, is_json: bool) -> String {
    if !is_json {
        return body.to_string();
    }
    match serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned())
    {
        Some(Value::String(detail)) => detail,
        Some(detail) => detail.to_string(),
        None => "Unknown error".to_string(),
    }
}
