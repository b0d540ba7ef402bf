//! Text-to-speech (TTS) processing

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::config::VoiceConfig;
use crate::{Error, Result};

const ELEVENLABS_TTS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

/// Turns reply text into playable audio
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize text to audio bytes
    ///
    /// # Errors
    ///
    /// Returns `Error::Synthesis` for empty text, a failed request, or an
    /// empty audio response
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// `ElevenLabs` speech synthesis client
pub struct ElevenLabsTts {
    client: reqwest::Client,
    api_key: SecretString,
    voice: String,
    model: String,
    output_format: String,
    base_url: String,
}

impl ElevenLabsTts {
    /// Create a new TTS client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: SecretString, config: &VoiceConfig) -> Result<Self> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(Error::Config(
                "ElevenLabs API key required for TTS".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            voice: config.tts_voice.clone(),
            model: config.tts_model.clone(),
            output_format: config.output_format.clone(),
            base_url: ELEVENLABS_TTS_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}?output_format={}",
            self.base_url.trim_end_matches('/'),
            self.voice,
            self.output_format
        )
    }
}

#[async_trait]
impl Synthesizer for ElevenLabsTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Synthesis("nothing to synthesize".to_string()));
        }

        tracing::debug!(
            chars = text.len(),
            voice = %self.voice,
            model = %self.model,
            "starting ElevenLabs synthesis"
        );

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("xi-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "ElevenLabs TTS request failed");
                Error::Synthesis(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "ElevenLabs TTS API error");
            return Err(Error::Synthesis(format!(
                "ElevenLabs TTS error {status}: {body}"
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| Error::Synthesis(format!("audio stream interrupted: {e}")))?;
        if audio.is_empty() {
            return Err(Error::Synthesis("TTS returned empty audio".to_string()));
        }

        tracing::info!(audio_bytes = audio.len(), "synthesis complete");
        Ok(audio.to_vec())
    }
}
