//! EmoCare - a conversational wellness companion
//!
//! The core is the conversation safety and response-routing policy:
//! - Crisis classification that bypasses generation entirely
//! - Prompt assembly from mood, focus area and journal excerpt
//! - An append-only per-session transcript
//!
//! Every hard capability (text generation, STT, TTS, PDF parsing) sits behind
//! a narrow trait so the core runs and tests without any UI or network.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │          Interfaces: HTTP API  │  terminal chat      │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │   Companion: sessions, turns, calm quest, journal    │
//! │   Policy: crisis classifier │ prompt │ router        │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │   Collaborators: Groq LLM │ ElevenLabs STT/TTS │ PDF │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod calm_quest;
pub mod capability;
pub mod companion;
pub mod config;
pub mod error;
pub mod journal;
pub mod llm;
pub mod policy;
pub mod reference;
pub mod session;
pub mod setup;
pub mod voice;

pub use capability::Capability;
pub use companion::{Capabilities, Companion, TurnReply};
pub use config::Config;
pub use error::{Error, Result};
pub use policy::{Classification, ResponseRouter, Route, RoutedReply, classify};
pub use session::{Session, SessionContext, Transcript};
