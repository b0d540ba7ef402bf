//! Whole-turn tests through the companion facade

use emocare::calm_quest::{COMPLETED_TURN_TEXT, CalmQuest};
use emocare::session::{Avatar, Mood, Role, Session};
use emocare::{Error, Route};

mod common;
use common::{MockGenerator, silent_wav, speech_wav, text_companion, voice_companion};

#[tokio::test]
async fn voice_turn_records_transcript_text() {
    let generator = MockGenerator::replying("I'm listening.");
    let companion = voice_companion(&generator, "Work has been a lot lately", false);
    let mut session = Session::new();

    let reply = companion.send_voice(&mut session, &speech_wav()).await.unwrap();

    assert_eq!(reply.user_text, "Work has been a lot lately");
    assert_eq!(reply.reply, "I'm listening.");
    let turns: Vec<_> = session.transcript.render().collect();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].text, "Work has been a lot lately");
}

#[tokio::test]
async fn voice_crisis_transcript_takes_crisis_path() {
    let generator = MockGenerator::replying("unused");
    let companion = voice_companion(&generator, "sometimes I think about suicide", false);
    let mut session = Session::new();

    let reply = companion.send_voice(&mut session, &speech_wav()).await.unwrap();
    assert!(reply.is_crisis());
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn silent_recording_records_nothing() {
    let generator = MockGenerator::replying("unused");
    let companion = voice_companion(&generator, "unused", false);
    let mut session = Session::new();

    let err = companion
        .send_voice(&mut session, &silent_wav())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transcription(_)));
    assert!(session.transcript.is_empty());
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn spoken_replies_carry_audio() {
    let generator = MockGenerator::replying("Breathe in slowly.");
    let companion = voice_companion(&generator, "unused", false);
    let mut session = Session::new();

    let quiet = companion.send_message(&mut session, "hello").await.unwrap();
    assert!(quiet.audio.is_none());
    assert!(session.last_reply_audio.is_none());

    session.speak_replies = true;
    let spoken = companion.send_message(&mut session, "hello again").await.unwrap();
    assert_eq!(spoken.audio.as_deref(), Some(&b"ID3:Breathe in slowly."[..]));
    assert_eq!(session.last_reply_audio, spoken.audio);
    assert!(spoken.audio_error.is_none());
}

#[tokio::test]
async fn synthesis_failure_keeps_text_reply() {
    let generator = MockGenerator::replying("Breathe in slowly.");
    let companion = voice_companion(&generator, "unused", true);
    let mut session = Session::new();
    session.speak_replies = true;

    let reply = companion.send_message(&mut session, "hello").await.unwrap();
    assert_eq!(reply.reply, "Breathe in slowly.");
    assert!(reply.audio.is_none());
    assert!(reply.audio_error.unwrap().contains("voice quota exceeded"));
    assert_eq!(session.transcript.len(), 2);
}

#[tokio::test]
async fn spoken_replies_without_tts_stay_silent() {
    let generator = MockGenerator::replying("ok");
    let companion = text_companion(&generator);
    let mut session = Session::new();
    session.speak_replies = true;

    let reply = companion.send_message(&mut session, "hello").await.unwrap();
    assert!(reply.audio.is_none());
    assert!(reply.audio_error.is_none());
}

#[tokio::test]
async fn calm_quest_recap_reaches_generator() {
    let generator = MockGenerator::replying("Lovely work.");
    let companion = text_companion(&generator);
    let mut session = Session::new();
    session.context.current_mood = Mood::Lonely;

    let mut quest = CalmQuest::new();
    quest.seen = "  window, plant, book ".to_string();
    quest.need = "a walk".to_string();
    session.calm_quest = Some(quest);

    let reply = companion.complete_calm_quest(&mut session).await.unwrap();
    assert_eq!(reply.route, Route::Generated);
    assert_eq!(reply.user_text, COMPLETED_TURN_TEXT);

    let (_, prompt) = generator.last_prompt().unwrap();
    assert!(prompt.contains("CALM QUEST RECAP:"));
    assert!(prompt.contains("- Mood: Lonely / Disconnected"));
    assert!(prompt.contains("- 3 things I see: window, plant, book\n"));
    assert!(session.calm_quest.is_none());
}

#[tokio::test]
async fn joke_uses_avatar_style_and_skips_transcript() {
    let generator = MockGenerator::replying("  What do seals sing? Arrr-ias!  ");
    let companion = text_companion(&generator);
    let mut session = Session::new();
    session.context.avatar = Avatar::Silly;

    let joke = companion.tell_joke(&mut session).await;
    assert_eq!(joke, "What do seals sing? Arrr-ias!");
    assert_eq!(session.last_joke.as_deref(), Some(joke.as_str()));
    assert!(session.transcript.is_empty());

    let (system, user) = generator.last_prompt().unwrap();
    assert!(system.contains("Style: extra goofy"));
    assert_eq!(user, "Tell me a joke.");
}

#[tokio::test]
async fn joke_failure_is_text() {
    let companion = text_companion(&MockGenerator::failing());
    let mut session = Session::new();

    let joke = companion.tell_joke(&mut session).await;
    assert!(joke.starts_with("LLM Error"));
}

#[tokio::test]
async fn blank_journal_is_not_used() {
    let generator = MockGenerator::replying("ok");
    let companion = text_companion(&generator);
    let mut session = Session::new();

    let summary = companion
        .load_journal(&mut session, b"   \n\t ".to_vec(), Some("blank.txt".to_string()))
        .await
        .unwrap();
    assert!(summary.empty);
    assert!(summary.word_cloud.is_empty());

    let reply = companion.send_message(&mut session, "hi").await.unwrap();
    assert!(!reply.used_journal);
}
