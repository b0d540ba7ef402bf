//! Conversation safety and response-routing policy
//!
//! For each utterance: classify for crisis signals, assemble the generation
//! request from session context, and produce a reply that never fails the
//! caller.

mod crisis;
mod prompt;
mod router;

pub use crisis::{CRISIS_KEYWORDS, CRISIS_RESPONSE, Classification, CrisisClassifier, classify};
pub use prompt::{
    DEFAULT_EXCERPT_CHARS, JOKE_USER_PROMPT, PromptRequest, SYSTEM_PROMPT, build_request,
    joke_system_prompt, truncate_chars,
};
pub use router::{ResponseRouter, Route, RoutedReply, describe_failure};
