//! Response routing: crisis short-circuit or generated reply

use std::sync::Arc;

use serde::Serialize;

use super::crisis::{CRISIS_RESPONSE, Classification, CrisisClassifier};
use super::prompt::{self, DEFAULT_EXCERPT_CHARS};
use crate::capability::Capability;
use crate::llm::{GenerationOptions, Generator};
use crate::session::SessionContext;
use crate::Result;

/// Which path produced a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// Fixed safety message, no generation
    Crisis,
    /// Reply from the generation collaborator
    Generated,
    /// Generation failed; the reply describes the failure
    Failed,
}

/// The reply for one utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutedReply {
    pub text: String,
    /// True iff journal context was merged into the generation request
    pub used_journal: bool,
    pub route: Route,
}

/// Decides, per utterance, between the crisis response and a generated reply
///
/// Never returns an error: generation failures become the reply text.
pub struct ResponseRouter {
    generator: Capability<Arc<dyn Generator>>,
    classifier: CrisisClassifier,
    options: GenerationOptions,
    excerpt_chars: usize,
}

impl ResponseRouter {
    /// Create a router with the built-in keyword set and default options
    #[must_use]
    pub fn new(generator: Capability<Arc<dyn Generator>>) -> Self {
        Self {
            generator,
            classifier: CrisisClassifier::default(),
            options: GenerationOptions::default(),
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: CrisisClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    #[must_use]
    pub const fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Journal characters merged into a request (at least one)
    #[must_use]
    pub fn with_excerpt_chars(mut self, excerpt_chars: usize) -> Self {
        self.excerpt_chars = excerpt_chars.max(1);
        self
    }

    #[must_use]
    pub const fn generator(&self) -> &Capability<Arc<dyn Generator>> {
        &self.generator
    }

    #[must_use]
    pub const fn classifier(&self) -> &CrisisClassifier {
        &self.classifier
    }

    /// Route an utterance to a reply
    pub async fn route(&self, utterance: &str, context: &SessionContext) -> RoutedReply {
        if let Some(keyword) = self.classifier.matched_keyword(utterance) {
            tracing::warn!(keyword, "crisis signal detected, returning safety message");
            return RoutedReply {
                text: CRISIS_RESPONSE.to_string(),
                used_journal: false,
                route: Route::Crisis,
            };
        }

        let request = prompt::build_request(utterance, context, self.excerpt_chars);
        let used_journal = request.used_journal;

        tracing::debug!(
            focus = %context.focus_area,
            mood = %context.current_mood,
            used_journal,
            "routing utterance to generation"
        );

        match self.generate(&request.system, &request.user).await {
            Ok(text) => RoutedReply {
                text,
                used_journal,
                route: Route::Generated,
            },
            Err(e) => {
                tracing::error!(error = %e, "generation failed, replying with error text");
                RoutedReply {
                    text: describe_failure(&e),
                    used_journal,
                    route: Route::Failed,
                }
            }
        }
    }

    /// Classify without routing
    #[must_use]
    pub fn classify(&self, utterance: &str) -> Classification {
        self.classifier.classify(utterance)
    }

    /// Single unclassified generation with the router's options
    ///
    /// # Errors
    ///
    /// Returns error if generation is unavailable or fails
    pub async fn freeform(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.generate(system_prompt, user_prompt).await
    }

    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let generator = self.generator.get()?;
        let text = generator
            .generate(system_prompt, user_prompt, &self.options)
            .await?;

        if text.trim().is_empty() {
            return Err(crate::Error::Generation(
                "model returned an empty reply".to_string(),
            ));
        }
        Ok(text)
    }
}

/// User-visible text for a failed generation
#[must_use]
pub fn describe_failure(error: &crate::Error) -> String {
    match error {
        crate::Error::Config(reason) => {
            format!("LLM Error: the language model is not configured ({reason}).")
        }
        other => format!("LLM Error: Could not generate response. ({other})"),
    }
}
