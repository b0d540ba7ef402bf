//! Prompt assembly for generation requests

use crate::session::{Avatar, Mood, SessionContext};

/// Default number of journal characters merged into a request
pub const DEFAULT_EXCERPT_CHARS: usize = 400;

/// Persona, role boundaries and tone for every supportive reply
pub const SYSTEM_PROMPT: &str = "\
You are an AI mental wellness companion named EmoCare.

Your role:
- Provide gentle emotional support and reflection.
- Help users understand their feelings and suggest simple, healthy coping ideas.
- Ask 1-2 gentle reflective questions when appropriate.

Important boundaries:
- You are not a doctor, therapist, counselor, or emergency service.
- You do not form personal, romantic, or exclusive relationships with users.
- If a user expresses romantic feelings toward you (e.g., \"I love you\", \"be my partner\", \"don't leave me\"),
  respond kindly, set a clear boundary, and encourage connection with real people (friends, family, trusted support).
- If a user becomes emotionally dependent or obsessed, gently redirect them toward healthy, real-world support.
- If a user uses sexual, explicit, or dirty talk, politely refuse to engage and redirect to emotional well-being support.
- Never claim to have feelings, a body, or a real relationship with the user.
- Never encourage secrecy, exclusivity, or replacing real human relationships.

Crisis handling:
- If the user expresses self-harm, suicidal thoughts, or immediate danger, stop normal conversation
  and clearly encourage them to seek emergency help using appropriate resources.

Tone & style:
- Warm, calm, empathetic, and non-judgmental.
- Kind but firm when setting boundaries.
- Supportive without encouraging dependence.
";

/// A fully assembled generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub system: String,
    pub user: String,
    /// Whether a journal excerpt was merged into `user`
    pub used_journal: bool,
}

/// Build the supportive-reply request for an utterance
///
/// The journal excerpt, when present and non-empty, is truncated to
/// `excerpt_chars` characters.
#[must_use]
pub fn build_request(utterance: &str, context: &SessionContext, excerpt_chars: usize) -> PromptRequest {
    let mut user = format!(
        "User's chosen focus area: {}\nUser's current mood: {}\n\n",
        context.focus_area, context.current_mood
    );

    let journal = context.journal();
    if let Some(text) = journal {
        user.push_str("The user has also shared some journal text. Snippet:\n");
        user.push_str(truncate_chars(text, excerpt_chars));
        user.push_str("\n\n");
    }

    user.push_str(utterance);

    PromptRequest {
        system: SYSTEM_PROMPT.to_string(),
        user,
        used_journal: journal.is_some(),
    }
}

/// System prompt for a single wholesome joke in the avatar's style
#[must_use]
pub fn joke_system_prompt(mood: Mood, avatar: Avatar) -> String {
    format!(
        "You are EmoCare, a friendly wellness companion.
Generate ONE short, genuinely funny, wholesome joke (max 2 lines).
No dark humor. No insults. No politics. No religion. No self-harm references.
Keep it safe and uplifting.

Style: {style}

User mood: {mood}
Avatar: {avatar}
",
        style = avatar.joke_style(),
    )
}

/// User turn paired with [`joke_system_prompt`]
pub const JOKE_USER_PROMPT: &str = "Tell me a joke.";

/// Longest prefix of `text` holding at most `max_chars` characters
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
