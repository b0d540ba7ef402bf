//! TOML configuration file loading
//!
//! Supports `~/.config/emocare/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EmoCareConfigFile {
    /// LLM configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Conversation policy tuning
    #[serde(default)]
    pub policy: PolicyFileConfig,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "llama-3.3-70b-versatile")
    pub model: Option<String>,

    /// OpenAI-compatible API base URL
    pub base_url: Option<String>,

    pub temperature: Option<f32>,

    pub max_tokens: Option<u32>,

    /// Stream completions and concatenate fragments
    pub stream: Option<bool>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct VoiceFileConfig {
    /// Enable voice input/output
    pub enabled: Option<bool>,

    /// STT model (e.g. "scribe_v1")
    pub stt_model: Option<String>,

    /// Language hint passed to STT (e.g. "en")
    pub language: Option<String>,

    /// TTS model (e.g. "eleven_multilingual_v2")
    pub tts_model: Option<String>,

    /// TTS voice identifier
    pub tts_voice: Option<String>,

    /// TTS output format (e.g. "mp3_44100_128")
    pub output_format: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiKeysFileConfig {
    pub groq: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Directory with a static web UI
    pub static_dir: Option<String>,

    /// Largest accepted voice or journal upload, in bytes
    pub max_upload_bytes: Option<usize>,

    /// Idle seconds before a session is dropped
    pub session_ttl_secs: Option<u64>,

    /// Live sessions kept at once
    pub max_sessions: Option<usize>,
}

/// Conversation policy configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PolicyFileConfig {
    /// Journal characters merged into a request
    pub excerpt_chars: Option<usize>,

    /// Phrases added to the built-in crisis keyword set
    pub extra_crisis_keywords: Option<Vec<String>>,

    /// Terms returned for a journal word cloud
    pub word_cloud_terms: Option<usize>,
}

/// Load the TOML config file from the standard path
///
/// Returns `EmoCareConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> EmoCareConfigFile {
    let Some(path) = config_file_path() else {
        return EmoCareConfigFile::default();
    };

    if !path.exists() {
        return EmoCareConfigFile::default();
    }

    match read_config_file(&path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            EmoCareConfigFile::default()
        }
    }
}

/// Read and parse a config file
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML
pub fn read_config_file(path: &Path) -> Result<EmoCareConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Serialize and write a config file, creating parent directories
///
/// # Errors
///
/// Returns error if the file cannot be written
pub fn write_config_file(path: &Path, config: &EmoCareConfigFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| crate::Error::Config(format!("failed to serialize config: {e}")))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Return the config file path: `$EMOCARE_CONFIG` or `~/.config/emocare/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("EMOCARE_CONFIG") {
        return Some(PathBuf::from(path));
    }

    directories::BaseDirs::new().map(|d| d.config_dir().join("emocare").join("config.toml"))
}
