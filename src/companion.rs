//! The companion facade the UI layers call
//!
//! Owns the response router and the optional voice collaborators, and runs
//! whole turns against a [`Session`]: record the user turn, route, record the
//! reply, optionally speak it.

use std::sync::Arc;

use serde::Serialize;

use crate::calm_quest::COMPLETED_TURN_TEXT;
use crate::capability::Capability;
use crate::config::Config;
use crate::journal::{AutoExtractor, DocumentExtractor, JournalDocument, Redaction, WordWeight};
use crate::llm::{Generator, GroqClient};
use crate::policy::{
    CrisisClassifier, JOKE_USER_PROMPT, ResponseRouter, Route, RoutedReply, describe_failure,
    joke_system_prompt,
};
use crate::session::{Role, Session};
use crate::voice::{ElevenLabsStt, ElevenLabsTts, Synthesizer, Transcriber};
use crate::{Error, Result};

/// Outcome of one conversational turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    /// Text recorded as the user turn
    pub user_text: String,
    pub reply: String,
    pub used_journal: bool,
    pub route: Route,
    /// Synthesized reply, when spoken replies are on and TTS worked
    #[serde(skip)]
    pub audio: Option<Vec<u8>>,
    /// Why the reply could not be spoken
    pub audio_error: Option<String>,
}

impl TurnReply {
    #[must_use]
    pub fn is_crisis(&self) -> bool {
        self.route == Route::Crisis
    }
}

/// Availability of one collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureStatus {
    pub available: bool,
    pub reason: Option<String>,
}

impl<T> From<&Capability<T>> for FeatureStatus {
    fn from(capability: &Capability<T>) -> Self {
        Self {
            available: capability.is_available(),
            reason: capability.reason().map(ToString::to_string),
        }
    }
}

/// Which optional features the UI may show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub generation: FeatureStatus,
    pub speech_to_text: FeatureStatus,
    pub text_to_speech: FeatureStatus,
}

/// Result of attaching a journal to a session
#[derive(Debug, Clone, Serialize)]
pub struct JournalSummary {
    pub filename: Option<String>,
    pub chars: usize,
    pub redactions: Vec<Redaction>,
    pub word_cloud: Vec<WordWeight>,
    /// Extraction found no usable text; the journal is not used as context
    pub empty: bool,
}

/// Wellness companion: conversation policy plus voice and journal collaborators
pub struct Companion {
    router: ResponseRouter,
    stt: Capability<Arc<dyn Transcriber>>,
    tts: Capability<Arc<dyn Synthesizer>>,
    extractor: Arc<dyn DocumentExtractor>,
    language: String,
    word_cloud_terms: usize,
}

impl Companion {
    /// Assemble a companion from explicit collaborators
    #[must_use]
    pub fn new(
        router: ResponseRouter,
        stt: Capability<Arc<dyn Transcriber>>,
        tts: Capability<Arc<dyn Synthesizer>>,
    ) -> Self {
        Self {
            router,
            stt,
            tts,
            extractor: Arc::new(AutoExtractor),
            language: "en".to_string(),
            word_cloud_terms: 100,
        }
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn DocumentExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    #[must_use]
    pub const fn with_word_cloud_terms(mut self, terms: usize) -> Self {
        self.word_cloud_terms = terms;
        self
    }

    /// Build every collaborator the configuration allows
    ///
    /// Missing credentials disable the affected feature instead of failing.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let generator: Capability<Arc<dyn Generator>> = match &config.api_keys.groq {
            Some(key) => Capability::from_result(
                "generation",
                GroqClient::new(key.clone(), &config.llm)
                    .map(|client| Arc::new(client) as Arc<dyn Generator>),
            ),
            None => Capability::unavailable("GROQ_API_KEY is not set"),
        };

        let (stt, tts) = if !config.voice.enabled {
            (
                Capability::unavailable("voice is disabled"),
                Capability::unavailable("voice is disabled"),
            )
        } else if let Some(key) = &config.api_keys.elevenlabs {
            let stt = Capability::from_result(
                "speech-to-text",
                ElevenLabsStt::new(key.clone(), &config.voice)
                    .map(|client| Arc::new(client) as Arc<dyn Transcriber>),
            );
            let tts = Capability::from_result(
                "text-to-speech",
                ElevenLabsTts::new(key.clone(), &config.voice)
                    .map(|client| Arc::new(client) as Arc<dyn Synthesizer>),
            );
            (stt, tts)
        } else {
            (
                Capability::unavailable("ELEVENLABS_API_KEY is not set"),
                Capability::unavailable("ELEVENLABS_API_KEY is not set"),
            )
        };

        let router = ResponseRouter::new(generator)
            .with_classifier(CrisisClassifier::new(&config.policy.crisis_keywords))
            .with_options(config.generation_options())
            .with_excerpt_chars(config.policy.excerpt_chars);

        let companion = Self::new(router, stt, tts)
            .with_language(config.voice.language.clone())
            .with_word_cloud_terms(config.policy.word_cloud_terms);

        let caps = companion.capabilities();
        tracing::info!(
            generation = caps.generation.available,
            stt = caps.speech_to_text.available,
            tts = caps.text_to_speech.available,
            "companion ready"
        );
        companion
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            generation: self.router.generator().into(),
            speech_to_text: (&self.stt).into(),
            text_to_speech: (&self.tts).into(),
        }
    }

    #[must_use]
    pub const fn router(&self) -> &ResponseRouter {
        &self.router
    }

    /// Run a text turn
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyUtterance` for blank input. Collaborator failures
    /// never fail the turn.
    pub async fn send_message(&self, session: &mut Session, text: &str) -> Result<TurnReply> {
        if text.trim().is_empty() {
            return Err(Error::EmptyUtterance);
        }

        session.transcript.record(Role::User, text, false);
        let routed = self.router.route(text, &session.context).await;
        Ok(self.finish_turn(session, text.to_string(), routed).await)
    }

    /// Transcribe recorded speech and run it as a text turn
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when STT is unavailable, `Error::Transcription`
    /// for unusable audio. Nothing is recorded in those cases.
    pub async fn send_voice(&self, session: &mut Session, audio: &[u8]) -> Result<TurnReply> {
        let stt = self.stt.get()?;
        let text = stt.transcribe(audio, &self.language).await?;
        tracing::debug!(session = %session.id, chars = text.len(), "voice turn transcribed");
        self.send_message(session, &text).await
    }

    /// Finish the session's calm quest and reply to its recap
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when no quest is in progress
    pub async fn complete_calm_quest(&self, session: &mut Session) -> Result<TurnReply> {
        let quest = session
            .calm_quest
            .take()
            .ok_or_else(|| Error::NotFound("no calm quest in progress".to_string()))?;

        let recap = quest.recap(&session.context);
        session
            .transcript
            .record(Role::User, COMPLETED_TURN_TEXT, false);
        let routed = self.router.route(&recap, &session.context).await;

        tracing::info!(session = %session.id, route = ?routed.route, "calm quest completed");
        Ok(self
            .finish_turn(session, COMPLETED_TURN_TEXT.to_string(), routed)
            .await)
    }

    /// A short joke in the style of the session's avatar
    ///
    /// Not recorded in the transcript. Failures become the returned text.
    pub async fn tell_joke(&self, session: &mut Session) -> String {
        let system = joke_system_prompt(session.context.current_mood, session.context.avatar);
        let joke = match self.router.freeform(&system, JOKE_USER_PROMPT).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "joke generation failed");
                describe_failure(&e)
            }
        };
        session.last_joke = Some(joke.clone());
        joke
    }

    /// Extract and anonymize a journal document off the async runtime
    ///
    /// # Errors
    ///
    /// Returns `Error::Document` if the extraction task dies
    pub async fn ingest_journal(
        &self,
        document: Vec<u8>,
        filename: Option<String>,
    ) -> Result<JournalDocument> {
        let extractor = Arc::clone(&self.extractor);

        // PDF parsing is CPU-bound
        tokio::task::spawn_blocking(move || {
            JournalDocument::ingest(extractor.as_ref(), &document, filename)
        })
        .await
        .map_err(|e| Error::Document(format!("journal extraction task failed: {e}")))
    }

    /// Attach an ingested journal to a session
    pub fn attach_journal(&self, session: &mut Session, journal: JournalDocument) -> JournalSummary {
        let summary = JournalSummary {
            filename: journal.filename.clone(),
            chars: journal.text.chars().count(),
            redactions: journal.redactions.clone(),
            word_cloud: journal.word_cloud(self.word_cloud_terms),
            empty: journal.is_empty(),
        };
        session.attach_journal(journal);
        summary
    }

    /// Extract, anonymize and attach a journal document
    ///
    /// # Errors
    ///
    /// Returns `Error::Document` if the extraction task dies
    pub async fn load_journal(
        &self,
        session: &mut Session,
        document: Vec<u8>,
        filename: Option<String>,
    ) -> Result<JournalSummary> {
        let journal = self.ingest_journal(document, filename).await?;
        Ok(self.attach_journal(session, journal))
    }

    /// Speak arbitrary text
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when TTS is unavailable, or the synthesis error
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.tts.get()?.synthesize(text).await
    }

    async fn finish_turn(
        &self,
        session: &mut Session,
        user_text: String,
        routed: RoutedReply,
    ) -> TurnReply {
        session
            .transcript
            .record(Role::Assistant, routed.text.clone(), routed.used_journal);

        let (audio, audio_error) = self.speak(session, &routed.text).await;
        session.last_reply_audio.clone_from(&audio);

        TurnReply {
            user_text,
            reply: routed.text,
            used_journal: routed.used_journal,
            route: routed.route,
            audio,
            audio_error,
        }
    }

    async fn speak(&self, session: &Session, text: &str) -> (Option<Vec<u8>>, Option<String>) {
        if !session.speak_replies {
            return (None, None);
        }
        let Some(tts) = self.tts.as_option() else {
            tracing::debug!("spoken replies requested but TTS is unavailable");
            return (None, None);
        };

        match tts.synthesize(text).await {
            Ok(audio) => (Some(audio), None),
            Err(e) => {
                tracing::warn!(session = %session.id, error = %e, "could not speak reply");
                (None, Some(e.to_string()))
            }
        }
    }
}
