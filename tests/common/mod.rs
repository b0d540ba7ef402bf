//! Shared test utilities

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use emocare::llm::{GenerationOptions, Generator};
use emocare::voice::{SAMPLE_RATE, Synthesizer, Transcriber, samples_to_wav};
use emocare::{Capability, Companion, Error, ResponseRouter, Result};

/// Generator double that records every call
#[derive(Default)]
pub struct MockGenerator {
    reply: String,
    fail: bool,
    calls: AtomicUsize,
    prompts: Mutex<Vec<(String, String)>>,
}

impl MockGenerator {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            ..Self::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Last (system, user) prompt pair
    pub fn last_prompt(&self) -> Option<(String, String)> {
        self.prompts.lock().expect("prompt lock").last().cloned()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .expect("prompt lock")
            .push((system_prompt.to_string(), user_prompt.to_string()));

        if self.fail {
            return Err(Error::Generation("service unavailable".to_string()));
        }
        Ok(self.reply.clone())
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

/// Transcriber double returning a fixed transcript after screening the audio
pub struct MockTranscriber {
    pub transcript: String,
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio: &[u8], _language_hint: &str) -> Result<String> {
        emocare::voice::ensure_speech(audio)?;
        Ok(self.transcript.clone())
    }
}

/// Synthesizer double: fixed bytes, or a failure
pub struct MockSynthesizer {
    pub fail: bool,
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if self.fail {
            return Err(Error::Synthesis("voice quota exceeded".to_string()));
        }
        Ok(format!("ID3:{text}").into_bytes())
    }
}

/// Router over a mock generator
pub fn router_with(generator: &Arc<MockGenerator>) -> ResponseRouter {
    let generator: Arc<dyn Generator> = generator.clone();
    ResponseRouter::new(Capability::Available(generator))
}

/// Companion with a mock generator and no voice
pub fn text_companion(generator: &Arc<MockGenerator>) -> Companion {
    Companion::new(
        router_with(generator),
        Capability::unavailable("ELEVENLABS_API_KEY is not set"),
        Capability::unavailable("ELEVENLABS_API_KEY is not set"),
    )
}

/// Companion with mock generator, STT and TTS
pub fn voice_companion(
    generator: &Arc<MockGenerator>,
    transcript: &str,
    tts_fails: bool,
) -> Companion {
    let stt: Arc<dyn Transcriber> = Arc::new(MockTranscriber {
        transcript: transcript.to_string(),
    });
    let tts: Arc<dyn Synthesizer> = Arc::new(MockSynthesizer { fail: tts_fails });
    Companion::new(
        router_with(generator),
        Capability::Available(stt),
        Capability::Available(tts),
    )
}

/// One second of a 440 Hz tone as WAV
pub fn speech_wav() -> Vec<u8> {
    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..SAMPLE_RATE)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.3
        })
        .collect();
    samples_to_wav(&samples, SAMPLE_RATE).expect("encode tone")
}

/// Half a second of digital silence as WAV
pub fn silent_wav() -> Vec<u8> {
    samples_to_wav(&vec![0.0; (SAMPLE_RATE / 2) as usize], SAMPLE_RATE).expect("encode silence")
}
