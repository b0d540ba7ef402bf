//! Voice processing module
//!
//! Speech-to-text and text-to-speech collaborators behind narrow traits, plus
//! WAV helpers used to screen recordings before they are uploaded.

mod stt;
mod tts;
mod wav;

pub use stt::{ElevenLabsStt, Transcriber};
pub use tts::{ElevenLabsTts, Synthesizer};
pub use wav::{SAMPLE_RATE, WavSummary, ensure_speech, inspect_wav, samples_to_wav};
