//! Crisis signal detection
//!
//! Deliberately conservative: plain substring matching with no negation
//! handling. A false positive costs a safety message; a false negative is not
//! acceptable.

use serde::Serialize;

/// Phrases that route an utterance to the crisis response
pub const CRISIS_KEYWORDS: &[&str] = &[
    "kill myself",
    "end my life",
    "suicidal",
    "suicide",
    "don't want to live",
    "want to die",
    "self harm",
    "ending it all",
    "can't go on",
    "hopeless",
];

/// Fixed reply for crisis utterances; never generated
pub const CRISIS_RESPONSE: &str = "I'm really glad you reached out and shared this with me. \
I'm only a computer program and **I can't help in an emergency**. \
**If you are in immediate danger, please:**\n\
- Call your local emergency number right now (like **911** in the U.S.).\n\
- If you're in the U.S., you can also call or text **988** to reach the Suicide & Crisis Lifeline.\n\
Your safety and wellbeing are important. 💜";

/// Outcome of classifying an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Crisis,
    Normal,
}

/// Case-insensitive substring classifier over a static keyword set
#[derive(Debug, Clone)]
pub struct CrisisClassifier {
    keywords: Vec<String>,
}

impl CrisisClassifier {
    /// Build a classifier over custom phrases (normalized to lowercase)
    #[must_use]
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| normalize(k.as_ref().trim()))
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// Classify an utterance
    #[must_use]
    pub fn classify(&self, utterance: &str) -> Classification {
        if self.matched_keyword(utterance).is_some() {
            Classification::Crisis
        } else {
            Classification::Normal
        }
    }

    /// The first keyword found in the utterance, if any
    #[must_use]
    pub fn matched_keyword(&self, utterance: &str) -> Option<&str> {
        if utterance.is_empty() {
            return None;
        }
        let normalized = normalize(utterance);
        self.keywords
            .iter()
            .find(|k| normalized.contains(k.as_str()))
            .map(String::as_str)
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Default for CrisisClassifier {
    fn default() -> Self {
        Self::new(CRISIS_KEYWORDS)
    }
}

/// Classify against the built-in keyword set
#[must_use]
pub fn classify(utterance: &str) -> Classification {
    CrisisClassifier::default().classify(utterance)
}

/// Lowercase and fold typographic apostrophes so "don’t" matches "don't"
fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}
