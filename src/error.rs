//! Error types for EmoCare

use thiserror::Error;

/// Result type alias for EmoCare operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in EmoCare
#[derive(Debug, Error)]
pub enum Error {
    /// A required collaborator credential or client is missing
    #[error("configuration error: {0}")]
    Config(String),

    /// Generation service unreachable or returned malformed output
    #[error("generation error: {0}")]
    Generation(String),

    /// Speech-to-text error, including silent or empty audio
    #[error("transcription error: {0}")]
    Transcription(String),

    /// Text-to-speech error
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Journal document error
    #[error("document error: {0}")]
    Document(String),

    /// Utterance was empty or whitespace-only
    #[error("utterance is empty")]
    EmptyUtterance,

    /// Session does not exist (or has ended)
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// WAV decoding error
    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),
}
