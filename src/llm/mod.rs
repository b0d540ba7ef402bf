//! Text generation collaborator
//!
//! The policy engine only sees the [`Generator`] trait. [`GroqClient`] talks to
//! an OpenAI-compatible chat completions endpoint.

mod groq;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

pub use groq::GroqClient;

/// Sampling options for a single generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1500,
        }
    }
}

/// Produces text from a system prompt and a user prompt
///
/// Implementations may stream internally, but always return the complete
/// text. Failures are `Error::Generation` (or transport errors).
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a reply
    ///
    /// # Errors
    ///
    /// Returns error if the service is unreachable or the output is unusable
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String>;

    /// Model identifier, for logs and capability reporting
    fn model(&self) -> &str;
}
