//! Per-session state: conversation context and transcript
//!
//! A [`Session`] is exclusively owned by one user session. Nothing here is
//! process-wide; callers pass the session into the companion by reference.

mod transcript;

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::Error;
use crate::calm_quest::CalmQuest;
use crate::journal::JournalDocument;

pub use transcript::{ConversationTurn, Role, Transcript};

/// Declares a label-backed enum: serialized and parsed by its display label
macro_rules! labeled_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every variant, in display order
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Human-readable label shown in the UI and sent to the model
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            /// Parse from a label, ignoring ASCII case and surrounding whitespace
            #[must_use]
            pub fn from_label(label: &str) -> Option<Self> {
                let label = label.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(label))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_label(s).ok_or_else(|| {
                    Error::NotFound(format!("{} '{s}'", stringify!($name)))
                })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_label(&s).ok_or_else(|| {
                    serde::de::Error::custom(format!("unknown {} '{s}'", stringify!($name)))
                })
            }
        }
    };
}

labeled_enum! {
    /// Conversation topic the user wants to focus on
    FocusArea {
        #[default]
        GeneralCheckIn => "General Check-in",
        StressAnxiety => "Stress & Anxiety",
        MoodEmotions => "Mood & Emotions",
        Relationships => "Relationships",
        AcademicWork => "Academic / Work Pressure",
        ConfidenceMotivation => "Self-confidence & Motivation",
        SleepLifestyle => "Sleep & Lifestyle",
    }
}

labeled_enum! {
    /// How the user says they feel right now
    Mood {
        #[default]
        Neutral => "Neutral",
        Happy => "Happy / Excited",
        Calm => "Calm / Okay",
        Stressed => "Stressed / Overwhelmed",
        Sad => "Sad / Low",
        Angry => "Angry / Frustrated",
        Lonely => "Lonely / Disconnected",
    }
}

labeled_enum! {
    /// Companion character shown next to the chat
    Avatar {
        #[default]
        Bunny => "Bunny",
        Pandy => "Pandy",
        Silly => "Silly",
    }
}

impl Avatar {
    /// Emoji rendered for the avatar
    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Bunny => "🐰",
            Self::Pandy => "🐼",
            Self::Silly => "🦭",
        }
    }

    /// Joke style hint passed to the model
    #[must_use]
    pub const fn joke_style(self) -> &'static str {
        match self {
            Self::Bunny => "cute + gentle",
            Self::Pandy => "playful",
            Self::Silly => "extra goofy",
        }
    }

    /// Greeting line shown under the avatar
    #[must_use]
    pub fn greeting(self) -> String {
        format!("{self} says, \"Hey, you've got a friend in me.\"")
    }
}

/// Context merged into every generation request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub focus_area: FocusArea,
    pub current_mood: Mood,
    /// Anonymized journal text; truncated when included in a request
    pub journal_excerpt: Option<String>,
    pub avatar: Avatar,
}

impl SessionContext {
    /// The journal excerpt, if present and non-empty
    #[must_use]
    pub fn journal(&self) -> Option<&str> {
        self.journal_excerpt.as_deref().filter(|text| !text.is_empty())
    }

    /// Whether a request built from this context would carry journal text
    #[must_use]
    pub fn has_journal(&self) -> bool {
        self.journal().is_some()
    }
}

/// A single user session
///
/// Destroyed when the session ends; nothing is persisted.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub context: SessionContext,
    pub transcript: Transcript,
    /// Journal document the excerpt came from
    pub journal: Option<JournalDocument>,
    /// Mini-game in progress, if any
    pub calm_quest: Option<CalmQuest>,
    pub last_joke: Option<String>,
    /// Audio of the most recent spoken reply
    pub last_reply_audio: Option<Vec<u8>>,
    /// Synthesize assistant replies to audio when TTS is available
    pub speak_replies: bool,
    pub created_at: DateTime<Utc>,
    /// Last time a request touched this session
    pub last_active: Instant,
}

impl Session {
    /// Create an empty session with default context
    #[must_use]
    pub fn new() -> Self {
        Self::with_context(SessionContext::default())
    }

    /// Create an empty session with the given context
    #[must_use]
    pub fn with_context(context: SessionContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            context,
            transcript: Transcript::new(),
            journal: None,
            calm_quest: None,
            last_joke: None,
            last_reply_audio: None,
            speak_replies: false,
            created_at: Utc::now(),
            last_active: Instant::now(),
        }
    }

    /// Mark the session as in use
    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    /// Time since the session was last touched
    #[must_use]
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_active)
    }

    /// Attach a journal document; its anonymized text becomes the excerpt
    pub fn attach_journal(&mut self, document: JournalDocument) {
        self.context.journal_excerpt = if document.text.trim().is_empty() {
            None
        } else {
            Some(document.text.clone())
        };
        self.journal = Some(document);
    }

    /// Remove the journal document and its excerpt
    pub fn clear_journal(&mut self) {
        self.journal = None;
        self.context.journal_excerpt = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
