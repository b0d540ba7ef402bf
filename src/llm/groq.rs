//! Groq chat completions client (OpenAI-compatible API)

use async_trait::async_trait;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{GenerationOptions, Generator};
use crate::config::LlmConfig;
use crate::{Error, Result};

/// Chat completions client for Groq or any OpenAI-compatible endpoint
pub struct GroqClient {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    stream: bool,
}

impl GroqClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be built
    pub fn new(api_key: SecretString, config: &LlmConfig) -> Result<Self> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(Error::Config("GROQ_API_KEY is not configured".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            stream: config.stream,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send(&self, request: &ChatRequest<'_>) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "chat completion request failed");
                Error::Generation(format!("request failed: {e}"))
            })?;

        let status = response.status();
        tracing::debug!(status = %status, stream = request.stream, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat completion API error");
            return Err(Error::Generation(format!("API error {status}: {body}")));
        }

        Ok(response)
    }

    async fn complete_batched(&self, request: &ChatRequest<'_>) -> Result<String> {
        let response = self.send(request).await?;
        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("malformed response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Generation("response contained no message".to_string()))
    }

    async fn complete_streamed(&self, request: &ChatRequest<'_>) -> Result<String> {
        let response = self.send(request).await?;
        let mut stream = response.bytes_stream();
        let mut reader = SseReader::default();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Generation(format!("stream interrupted: {e}")))?;
            if reader.push(&chunk) {
                break;
            }
        }

        reader.finish()
    }
}

#[async_trait]
impl Generator for GroqClient {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: options.temperature,
            max_completion_tokens: options.max_tokens,
            stream: self.stream,
        };

        tracing::debug!(
            model = %self.model,
            stream = self.stream,
            prompt_chars = user_prompt.len(),
            "starting generation"
        );

        let text = if self.stream {
            self.complete_streamed(&request).await?
        } else {
            self.complete_batched(&request).await?
        };

        tracing::info!(reply_chars = text.len(), "generation complete");
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_completion_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// One parsed server-sent-events line
#[derive(Debug, PartialEq, Eq)]
enum SseEvent {
    Delta(String),
    Done,
    Skip,
}

/// Splits a byte stream into SSE lines and collects the deltas
#[derive(Debug, Default)]
struct SseReader {
    buffer: Vec<u8>,
    text: String,
    done: bool,
}

impl SseReader {
    /// Feed a chunk; returns true once `[DONE]` has been seen
    fn push(&mut self, chunk: &[u8]) -> bool {
        self.buffer.extend_from_slice(chunk);
        while !self.done {
            let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') else {
                break;
            };
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.apply(&line);
        }
        self.done
    }

    fn apply(&mut self, line: &[u8]) {
        match parse_sse_line(&String::from_utf8_lossy(line)) {
            SseEvent::Delta(fragment) => self.text.push_str(&fragment),
            SseEvent::Done => self.done = true,
            SseEvent::Skip => {}
        }
    }

    /// End of stream; a last line without a newline still counts
    fn finish(mut self) -> Result<String> {
        if !self.done && !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            self.apply(&rest);
        }

        if self.text.is_empty() {
            return Err(Error::Generation("stream produced no text".to_string()));
        }
        Ok(self.text)
    }
}

/// Parse a `data: {...}` line from a streamed completion
fn parse_sse_line(line: &str) -> SseEvent {
    let Some(data) = line.trim().strip_prefix("data:") else {
        return SseEvent::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return SseEvent::Done;
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|s| !s.is_empty())
            .map_or(SseEvent::Skip, SseEvent::Delta),
        Err(e) => {
            tracing::debug!(error = %e, data, "skipping unparseable stream chunk");
            SseEvent::Skip
        }
    }
}
