//! Static mood reference data: action compass and music suggestions
//!
//! Lookups take free-form labels and never fail. Unknown labels yield
//! [`Lookup::NoRecommendation`].

use std::fmt;

use serde::Serialize;

/// A playlist search suggested for a mood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MusicSuggestion {
    pub title: &'static str,
    pub url: &'static str,
    pub reason: &'static str,
}

/// Result of a reference-data lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Lookup<T> {
    Found(T),
    NoRecommendation,
}

impl<T> Lookup<T> {
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NoRecommendation => None,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::NoRecommendation, Self::Found)
    }
}

impl<T: fmt::Display> fmt::Display for Lookup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(value) => value.fmt(f),
            Self::NoRecommendation => f.write_str("no recommendation"),
        }
    }
}

impl fmt::Display for MusicSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.url)
    }
}

struct MoodEntry {
    label: &'static str,
    short: &'static str,
    action: &'static str,
    music: MusicSuggestion,
}

// Compass display order
const MOODS: &[MoodEntry] = &[
    MoodEntry {
        label: "Angry / Frustrated",
        short: "Angry",
        action: "Sing it out – let the heat leave softly 🎵",
        music: MusicSuggestion {
            title: "Release & Reset (Workout / Rock)",
            url: "https://www.youtube.com/results?search_query=workout+rock+playlist",
            reason: "Helps release tension and channel energy safely.",
        },
    },
    MoodEntry {
        label: "Stressed / Overwhelmed",
        short: "Stressed",
        action: "Move your body – even 60 seconds counts 🏃",
        music: MusicSuggestion {
            title: "Relaxing Ambient / Breathable Beats",
            url: "https://www.youtube.com/results?search_query=relaxing+ambient+music+stress+relief",
            reason: "Slow, soft textures can help your nervous system downshift.",
        },
    },
    MoodEntry {
        label: "Lonely / Disconnected",
        short: "Lonely",
        action: "Send one message – connection starts small 💬",
        music: MusicSuggestion {
            title: "Warm Indie / Soft R&B",
            url: "https://www.youtube.com/results?search_query=warm+indie+playlist",
            reason: "Cozy vocals can feel like company.",
        },
    },
    MoodEntry {
        label: "Sad / Low",
        short: "Sad",
        action: "Name one tiny gratitude – a warm ember 💛",
        music: MusicSuggestion {
            title: "Soft Comfort Songs",
            url: "https://www.youtube.com/results?search_query=comfort+music+playlist",
            reason: "Gentle songs can feel supportive without forcing cheerfulness.",
        },
    },
    MoodEntry {
        label: "Calm / Okay",
        short: "Calm",
        action: "Protect this calm – slow down on purpose 🌿",
        music: MusicSuggestion {
            title: "Lo-fi Chill",
            url: "https://www.youtube.com/results?search_query=lofi+chill+beats",
            reason: "Supports calm focus and a steady vibe.",
        },
    },
    MoodEntry {
        label: "Happy / Excited",
        short: "Happy",
        action: "Celebrate it – dance, share, sparkle ✨",
        music: MusicSuggestion {
            title: "Upbeat Feel-Good Pop",
            url: "https://www.youtube.com/results?search_query=feel+good+pop+playlist",
            reason: "Keeps the energy high and positive.",
        },
    },
    MoodEntry {
        label: "Neutral",
        short: "Neutral",
        action: "Check in gently – what do you need right now? 🧘",
        music: MusicSuggestion {
            title: "Chill Focus Mix",
            url: "https://www.youtube.com/results?search_query=chill+focus+music",
            reason: "Light background music that helps you settle without changing your mood too much.",
        },
    },
];

const EXTRA_LINES: &[CompassNudge] = &[
    CompassNudge {
        feeling: "Burned out",
        action: "Take a slow walk – restart the engine gently 🚶‍♀️",
    },
    CompassNudge {
        feeling: "Overthinking",
        action: "Write it down – give your mind a shelf ✏️",
    },
    CompassNudge {
        feeling: "Anxious",
        action: "Breathe – your body understands the way home 🌬️",
    },
    CompassNudge {
        feeling: "Lazy",
        action: "Cold splash / stretch – wake up the senses ❄️",
    },
    CompassNudge {
        feeling: "Impatient",
        action: "Reflect on progress – you're further than you feel 🧭",
    },
];

/// One row of the action compass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompassLine {
    pub mood: &'static str,
    pub action: &'static str,
    /// Row matches the user's current mood
    pub active: bool,
}

/// A supplementary nudge for feelings outside the mood list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompassNudge {
    pub feeling: &'static str,
    pub action: &'static str,
}

/// Accepts either the full label ("Sad / Low") or its short name ("sad")
fn entry(label: &str) -> Option<&'static MoodEntry> {
    let label = label.trim();
    MOODS.iter().find(|e| {
        e.label.eq_ignore_ascii_case(label) || e.short.eq_ignore_ascii_case(label)
    })
}

/// Suggested action for a mood label
#[must_use]
pub fn mood_action(label: &str) -> Lookup<&'static str> {
    entry(label).map(|e| e.action).into()
}

/// Suggested music for a mood label
#[must_use]
pub fn mood_music(label: &str) -> Lookup<&'static MusicSuggestion> {
    entry(label).map(|e| &e.music).into()
}

/// Every compass row, flagging those whose mood appears in `current_mood`
#[must_use]
pub fn action_compass(current_mood: &str) -> Vec<CompassLine> {
    let current = current_mood.to_lowercase();
    MOODS
        .iter()
        .map(|e| CompassLine {
            mood: e.short,
            action: e.action,
            active: current.contains(&e.short.to_lowercase()),
        })
        .collect()
}

/// Supplementary nudges shown under the compass
#[must_use]
pub const fn extra_compass_lines() -> &'static [CompassNudge] {
    EXTRA_LINES
}

/// Everything the mood panel shows for one mood
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendations {
    pub action: Lookup<&'static str>,
    pub music: Lookup<&'static MusicSuggestion>,
    pub compass: Vec<CompassLine>,
    pub extra: &'static [CompassNudge],
}

/// Gather the action, music and compass for a mood label
#[must_use]
pub fn recommendations(current_mood: &str) -> Recommendations {
    Recommendations {
        action: mood_action(current_mood),
        music: mood_music(current_mood),
        compass: action_compass(current_mood),
        extra: extra_compass_lines(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Mood;

    #[test]
    fn recommendations_bundle_lookups() {
        let recs = recommendations(Mood::Calm.label());
        assert_eq!(recs.action, mood_action("Calm"));
        assert_eq!(recs.compass.iter().filter(|l| l.active).count(), 1);
        assert_eq!(recs.extra.len(), 5);

        let json = serde_json::to_value(recommendations("Unknown")).unwrap();
        assert_eq!(json["action"]["kind"], "no_recommendation");
    }

    #[test]
    fn every_mood_has_reference_data() {
        for mood in Mood::ALL {
            assert!(mood_action(mood.label()).is_found(), "no action for {mood}");
            assert!(mood_music(mood.label()).is_found(), "no music for {mood}");
        }
    }

    #[test]
    fn unknown_label_is_sentinel() {
        assert_eq!(mood_action("Unknown"), Lookup::NoRecommendation);
        assert_eq!(mood_music(""), Lookup::NoRecommendation);
        assert_eq!(mood_action("Unknown").to_string(), "no recommendation");
    }

    #[test]
    fn short_names_resolve() {
        assert_eq!(
            mood_action("stressed"),
            Lookup::Found("Move your body – even 60 seconds counts 🏃")
        );
        let music = mood_music("Lonely / Disconnected").found().unwrap();
        assert_eq!(music.title, "Warm Indie / Soft R&B");
    }

    #[test]
    fn compass_marks_current_mood() {
        let lines = action_compass("Sad / Low");
        assert_eq!(lines.len(), 7);
        let active: Vec<_> = lines.iter().filter(|l| l.active).map(|l| l.mood).collect();
        assert_eq!(active, vec!["Sad"]);

        assert!(action_compass("").iter().all(|l| !l.active));
    }

    #[test]
    fn extra_lines_cover_five_feelings() {
        let feelings: Vec<_> = extra_compass_lines().iter().map(|n| n.feeling).collect();
        assert_eq!(
            feelings,
            vec!["Burned out", "Overthinking", "Anxious", "Lazy", "Impatient"]
        );
    }
}
