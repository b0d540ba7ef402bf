//! Append-only conversation transcript

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One entry in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Set when the assistant reply was generated with journal context
    pub used_journal: bool,
}

impl ConversationTurn {
    /// A user turn stamped with the current time
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
            used_journal: false,
        }
    }

    /// An assistant turn stamped with the current time
    #[must_use]
    pub fn assistant(text: impl Into<String>, used_journal: bool) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
            used_journal,
        }
    }
}

/// Chronological, append-only history of a single session
///
/// Turns are never mutated or removed once appended. Timestamps are kept
/// non-decreasing: a turn stamped earlier than the last one is clamped to it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    turns: Vec<ConversationTurn>,
}

impl Transcript {
    #[must_use]
    pub const fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// Append a turn, preserving insertion order
    pub fn append(&mut self, mut turn: ConversationTurn) {
        if let Some(last) = self.turns.last() {
            if turn.timestamp < last.timestamp {
                tracing::trace!(
                    turn = %turn.timestamp,
                    last = %last.timestamp,
                    "clamping out-of-order timestamp"
                );
                turn.timestamp = last.timestamp;
            }
        }
        // User turns never carry journal context
        if turn.role == Role::User {
            turn.used_journal = false;
        }
        self.turns.push(turn);
    }

    /// Append a turn built from its parts, stamped now
    pub fn record(&mut self, role: Role, text: impl Into<String>, used_journal: bool) {
        let turn = match role {
            Role::User => ConversationTurn::user(text),
            Role::Assistant => ConversationTurn::assistant(text, used_journal),
        };
        self.append(turn);
    }

    /// Lazily iterate the full history in insertion order
    ///
    /// Each call starts a fresh pass over the transcript.
    pub fn render(&self) -> impl ExactSizeIterator<Item = &ConversationTurn> + '_ {
        self.turns.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }
}
