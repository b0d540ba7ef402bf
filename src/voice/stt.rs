//! Speech-to-text (STT) processing

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::wav::ensure_speech;
use crate::config::VoiceConfig;
use crate::{Error, Result};

const ELEVENLABS_STT_URL: &str = "https://api.elevenlabs.io/v1/speech-to-text";

/// Turns recorded speech into text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe WAV audio
    ///
    /// # Errors
    ///
    /// Returns `Error::Transcription` for empty, corrupt or silent audio and
    /// for an empty transcript
    async fn transcribe(&self, audio: &[u8], language_hint: &str) -> Result<String>;
}

/// Response from the `ElevenLabs` transcription API
#[derive(serde::Deserialize)]
struct ScribeResponse {
    #[serde(default)]
    text: String,
}

/// `ElevenLabs` Scribe transcription client
pub struct ElevenLabsStt {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    url: String,
}

impl ElevenLabsStt {
    /// Create a new STT client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: SecretString, config: &VoiceConfig) -> Result<Self> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(Error::Config(
                "ElevenLabs API key required for speech-to-text".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: config.stt_model.clone(),
            url: ELEVENLABS_STT_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl Transcriber for ElevenLabsStt {
    async fn transcribe(&self, audio: &[u8], language_hint: &str) -> Result<String> {
        ensure_speech(audio)?;

        tracing::debug!(
            audio_bytes = audio.len(),
            model = %self.model,
            language = language_hint,
            "starting ElevenLabs transcription"
        );

        let mut form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Transcription(e.to_string()))?,
            )
            .text("model_id", self.model.clone());
        if !language_hint.trim().is_empty() {
            form = form.text("language_code", language_hint.trim().to_string());
        }

        let response = self
            .client
            .post(&self.url)
            .header("xi-api-key", self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "ElevenLabs STT request failed");
                Error::Transcription(format!("request failed: {e}"))
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "ElevenLabs STT API error");
            return Err(Error::Transcription(format!(
                "ElevenLabs STT error {status}: {body}"
            )));
        }

        let result: ScribeResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse ElevenLabs STT response");
            Error::Transcription(format!("unexpected response format: {e}"))
        })?;

        let transcript = result.text.trim().to_string();
        if transcript.is_empty() {
            return Err(Error::Transcription(
                "transcription returned empty; please speak louder or check the microphone"
                    .to_string(),
            ));
        }

        tracing::info!(transcript_chars = transcript.len(), "transcription complete");
        Ok(transcript)
    }
}
