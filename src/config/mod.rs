//! Configuration management for EmoCare
//!
//! Values resolve with priority env > TOML file > default. Missing API keys
//! are not errors here; the companion turns them into unavailable features.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::policy::{CRISIS_KEYWORDS, DEFAULT_EXCERPT_CHARS};
use crate::{Error, Result};

use file::EmoCareConfigFile;

/// EmoCare configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Generation service configuration
    pub llm: LlmConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// HTTP API server configuration
    pub server: ServerConfig,

    /// Conversation policy configuration
    pub policy: PolicyConfig,
}

/// Generation service configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL
    pub base_url: String,

    /// Chat model identifier
    pub model: String,

    pub temperature: f32,

    pub max_tokens: u32,

    /// Stream completions instead of waiting for a single body
    pub stream: bool,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.7,
            max_tokens: 1500,
            stream: false,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable voice input and spoken replies
    pub enabled: bool,

    /// STT model (ElevenLabs, e.g. "scribe_v1")
    pub stt_model: String,

    /// Language hint for transcription
    pub language: String,

    /// TTS model (ElevenLabs, e.g. "eleven_multilingual_v2")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS output format
    pub output_format: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stt_model: "scribe_v1".to_string(),
            language: "en".to_string(),
            tts_model: "eleven_multilingual_v2".to_string(),
            tts_voice: "pNInz6obpgDQGcFmaJgB".to_string(),
            output_format: "mp3_44100_128".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// API keys for external services
///
/// Held as secrets from the moment they are resolved.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// Groq API key (text generation)
    pub groq: Option<SecretString>,

    /// `ElevenLabs` API key (STT and TTS)
    pub elevenlabs: Option<SecretString>,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Path to static files directory (web UI)
    pub static_dir: Option<PathBuf>,

    /// Body limit for the voice and journal upload routes
    pub max_upload_bytes: usize,

    /// Sessions idle longer than this are dropped
    pub session_ttl: Duration,

    /// Cap on live sessions; the least recently active one makes room
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 18_800,
            static_dir: None,
            max_upload_bytes: 25 * 1024 * 1024,
            session_ttl: Duration::from_secs(60 * 60),
            max_sessions: 1_000,
        }
    }
}

/// Conversation policy configuration
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Journal characters merged into a generation request
    pub excerpt_chars: usize,

    /// Full crisis keyword set (built-ins plus configured extras)
    pub crisis_keywords: Vec<String>,

    /// Terms returned for a journal word cloud
    pub word_cloud_terms: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
            crisis_keywords: CRISIS_KEYWORDS.iter().map(ToString::to_string).collect(),
            word_cloud_terms: 100,
        }
    }
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is out of range
    pub fn load() -> Result<Self> {
        Self::load_with_options(false)
    }

    /// Load configuration with explicit voice disable option
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is out of range
    pub fn load_with_options(disable_voice: bool) -> Result<Self> {
        let fc = file::load_config_file();
        let mut config = Self::resolve(fc, |key| std::env::var(key).ok())?;

        if disable_voice {
            tracing::info!("voice explicitly disabled via --disable-voice");
            config.voice.enabled = false;
        }

        Ok(config)
    }

    /// Merge a parsed config file with environment lookups (env wins)
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is out of range
    pub fn resolve<F>(fc: EmoCareConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let llm_default = LlmConfig::default();
        let voice_default = VoiceConfig::default();
        let server_default = ServerConfig::default();
        let policy_default = PolicyConfig::default();

        // API keys (env > toml > None); blank values count as unset
        let api_keys = ApiKeys {
            groq: env("GROQ_API_KEY")
                .or(fc.api_keys.groq)
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from),
            elevenlabs: env("ELEVENLABS_API_KEY")
                .or(fc.api_keys.elevenlabs)
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from),
        };

        let llm = LlmConfig {
            base_url: env("EMOCARE_LLM_BASE_URL")
                .or(fc.llm.base_url)
                .unwrap_or(llm_default.base_url),
            model: env("EMOCARE_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or(llm_default.model),
            temperature: env("EMOCARE_LLM_TEMPERATURE")
                .and_then(|s| s.parse().ok())
                .or(fc.llm.temperature)
                .unwrap_or(llm_default.temperature),
            max_tokens: env("EMOCARE_LLM_MAX_TOKENS")
                .and_then(|s| s.parse().ok())
                .or(fc.llm.max_tokens)
                .unwrap_or(llm_default.max_tokens),
            stream: env("EMOCARE_LLM_STREAM")
                .map(|v| parse_flag(&v))
                .or(fc.llm.stream)
                .unwrap_or(llm_default.stream),
            timeout: fc
                .llm
                .timeout_secs
                .map_or(llm_default.timeout, Duration::from_secs),
        };

        let voice = VoiceConfig {
            enabled: env("EMOCARE_VOICE_ENABLED")
                .map(|v| parse_flag(&v))
                .or(fc.voice.enabled)
                .unwrap_or(voice_default.enabled),
            stt_model: env("EMOCARE_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or(voice_default.stt_model),
            language: env("EMOCARE_STT_LANGUAGE")
                .or(fc.voice.language)
                .unwrap_or(voice_default.language),
            tts_model: env("EMOCARE_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or(voice_default.tts_model),
            tts_voice: env("EMOCARE_TTS_VOICE")
                .or(fc.voice.tts_voice)
                .unwrap_or(voice_default.tts_voice),
            output_format: fc
                .voice
                .output_format
                .unwrap_or(voice_default.output_format),
            timeout: voice_default.timeout,
        };

        let server = ServerConfig {
            port: env("EMOCARE_PORT")
                .or_else(|| env("PORT"))
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(server_default.port),
            static_dir: env("EMOCARE_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from),
            max_upload_bytes: env("EMOCARE_MAX_UPLOAD_BYTES")
                .and_then(|s| s.parse().ok())
                .or(fc.server.max_upload_bytes)
                .unwrap_or(server_default.max_upload_bytes),
            session_ttl: env("EMOCARE_SESSION_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .or(fc.server.session_ttl_secs)
                .map_or(server_default.session_ttl, Duration::from_secs),
            max_sessions: env("EMOCARE_MAX_SESSIONS")
                .and_then(|s| s.parse().ok())
                .or(fc.server.max_sessions)
                .unwrap_or(server_default.max_sessions),
        };

        let mut crisis_keywords = policy_default.crisis_keywords;
        let extra_keywords = env("EMOCARE_EXTRA_CRISIS_KEYWORDS")
            .map(|s| {
                s.split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect::<Vec<_>>()
            })
            .or(fc.policy.extra_crisis_keywords)
            .unwrap_or_default();
        crisis_keywords.extend(extra_keywords);

        let policy = PolicyConfig {
            excerpt_chars: env("EMOCARE_EXCERPT_CHARS")
                .and_then(|s| s.parse().ok())
                .or(fc.policy.excerpt_chars)
                .unwrap_or(policy_default.excerpt_chars),
            crisis_keywords,
            word_cloud_terms: fc
                .policy
                .word_cloud_terms
                .unwrap_or(policy_default.word_cloud_terms),
        };

        let config = Self {
            llm,
            voice,
            api_keys,
            server,
            policy,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check ranges the collaborators would otherwise reject at request time
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::Config(format!(
                "temperature must be between 0 and 2, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.max_tokens == 0 {
            return Err(Error::Config("max_tokens must be positive".to_string()));
        }
        if self.policy.excerpt_chars == 0 {
            return Err(Error::Config("excerpt_chars must be positive".to_string()));
        }
        if self.server.max_sessions == 0 {
            return Err(Error::Config("max_sessions must be positive".to_string()));
        }
        if self.server.session_ttl.is_zero() {
            return Err(Error::Config("session_ttl_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// Generation options derived from the LLM section
    #[must_use]
    pub const fn generation_options(&self) -> crate::llm::GenerationOptions {
        crate::llm::GenerationOptions {
            temperature: self.llm.temperature,
            max_tokens: self.llm.max_tokens,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
