//! Calm Quest: a three-step breathing, grounding and one-line journal game

use serde::{Deserialize, Serialize};

use crate::session::SessionContext;

/// Shortest breathing round, in seconds
pub const MIN_BREATH_SECONDS: u32 = 10;
/// Longest breathing round, in seconds
pub const MAX_BREATH_SECONDS: u32 = 45;
/// Breathing round used when none is chosen
pub const DEFAULT_BREATH_SECONDS: u32 = 20;

/// Transcript text recorded for the user when a quest is finished
pub const COMPLETED_TURN_TEXT: &str = "🎮 Completed Calm Quest";

/// Seconds per inhale or exhale
const CUE_PERIOD: u32 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStep {
    #[default]
    Breathing,
    Grounding,
    Journal,
}

impl QuestStep {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Breathing => "Step 1 – Breathing Timer 🌬️",
            Self::Grounding => "Step 2 – Grounding (3 things you see) 👀",
            Self::Journal => "Step 3 – One-line Journal ✏️",
        }
    }

    const fn next(self) -> Self {
        match self {
            Self::Breathing => Self::Grounding,
            Self::Grounding | Self::Journal => Self::Journal,
        }
    }

    const fn previous(self) -> Self {
        match self {
            Self::Breathing | Self::Grounding => Self::Breathing,
            Self::Journal => Self::Grounding,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreathCue {
    Inhale,
    Exhale,
}

impl BreathCue {
    /// Cue shown during second `second` of a breathing round
    #[must_use]
    pub const fn at(second: u32) -> Self {
        if (second / CUE_PERIOD) % 2 == 0 {
            Self::Inhale
        } else {
            Self::Exhale
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inhale => "Inhale…",
            Self::Exhale => "Exhale…",
        }
    }
}

/// State of a quest in progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalmQuest {
    pub step: QuestStep,
    breath_seconds: u32,
    /// Three things the user can see, comma separated
    pub seen: String,
    /// Completion of "Right now I need…"
    pub need: String,
}

impl Default for CalmQuest {
    fn default() -> Self {
        Self {
            step: QuestStep::default(),
            breath_seconds: DEFAULT_BREATH_SECONDS,
            seen: String::new(),
            need: String::new(),
        }
    }
}

impl CalmQuest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn breath_seconds(&self) -> u32 {
        self.breath_seconds
    }

    /// Set the breathing round length, clamped to 10..=45 seconds
    pub fn set_breath_seconds(&mut self, seconds: u32) {
        self.breath_seconds = seconds.clamp(MIN_BREATH_SECONDS, MAX_BREATH_SECONDS);
    }

    /// Cue for every second of the breathing round
    #[must_use]
    pub fn breathing_cues(&self) -> Vec<BreathCue> {
        (0..self.breath_seconds).map(BreathCue::at).collect()
    }

    pub fn advance(&mut self) {
        self.step = self.step.next();
    }

    pub fn back(&mut self) {
        self.step = self.step.previous();
    }

    /// Message routed to the companion when the quest is finished
    #[must_use]
    pub fn recap(&self, context: &SessionContext) -> String {
        format!(
            "CALM QUEST RECAP:\n\
             - Mood: {}\n\
             - Focus area: {}\n\
             - 3 things I see: {}\n\
             - Right now I need: {}\n\
             \n\
             Please respond warmly with:\n\
             1) One supportive sentence\n\
             2) One tiny next step (2 minutes)\n\
             3) One gentle reflective question\n",
            context.current_mood,
            context.focus_area,
            self.seen.trim(),
            self.need.trim(),
        )
    }
}
