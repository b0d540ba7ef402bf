//! API endpoint integration tests

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use emocare::Companion;
use emocare::api::{ApiState, router};
use emocare::config::ServerConfig;
use serde_json::{Value, json};
use tower::ServiceExt;

mod common;
use common::{MockGenerator, speech_wav, text_companion, voice_companion};

/// Build a test API router around a companion
fn build_test_router(companion: Companion) -> Router {
    router(Arc::new(ApiState::new(Arc::new(companion))))
}

fn build_limited_router(companion: Companion, server: &ServerConfig) -> Router {
    router(Arc::new(ApiState::with_limits(Arc::new(companion), server)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn send_raw(app: &Router, uri: &str, body: Vec<u8>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn create_session(app: &Router, body: Option<Value>) -> String {
    let (status, json) = send(app, "POST", "/api/sessions", body).await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router(text_companion(&MockGenerator::replying("hi")));

    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["sessions"], 0);

    create_session(&app, None).await;
    let (_, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(json["sessions"], 1);
}

#[tokio::test]
async fn test_capabilities_report_missing_voice() {
    let app = build_test_router(text_companion(&MockGenerator::replying("hi")));

    let (status, json) = send(&app, "GET", "/api/capabilities", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["generation"]["available"], true);
    assert_eq!(json["speech_to_text"]["available"], false);
    assert_eq!(
        json["text_to_speech"]["reason"],
        "ELEVENLABS_API_KEY is not set"
    );
}

#[tokio::test]
async fn test_options_list_labels() {
    let app = build_test_router(text_companion(&MockGenerator::replying("hi")));

    let (status, json) = send(&app, "GET", "/api/options", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["focus_areas"].as_array().unwrap().len(), 7);
    assert_eq!(json["moods"][0], "Neutral");
    assert_eq!(json["avatars"][1]["name"], "Pandy");
    assert_eq!(json["avatars"][1]["emoji"], "🐼");
}

#[tokio::test]
async fn test_session_defaults_and_context_update() {
    let app = build_test_router(text_companion(&MockGenerator::replying("hi")));
    let id = create_session(&app, None).await;

    let (status, json) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["focus_area"], "General Check-in");
    assert_eq!(json["current_mood"], "Neutral");
    assert_eq!(json["avatar"], "Bunny");
    assert_eq!(json["has_journal"], false);
    assert_eq!(json["turns"], 0);

    let (status, json) = send(
        &app,
        "PATCH",
        &format!("/api/sessions/{id}/context"),
        Some(json!({ "current_mood": "Sad / Low", "avatar": "Silly" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current_mood"], "Sad / Low");
    assert_eq!(json["avatar_emoji"], "🦭");
    assert_eq!(json["focus_area"], "General Check-in");
}

#[tokio::test]
async fn test_unknown_mood_label_is_rejected() {
    let app = build_test_router(text_companion(&MockGenerator::replying("hi")));
    let id = create_session(&app, None).await;

    let (status, json) = send(
        &app,
        "PATCH",
        &format!("/api/sessions/{id}/context"),
        Some(json!({ "current_mood": "Ecstatic" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"]["code"], "invalid_request");
    assert!(json["error"]["message"].as_str().unwrap().contains("Ecstatic"));

    let (_, json) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(json["current_mood"], "Neutral");
}

#[tokio::test]
async fn test_malformed_session_id_is_json_error() {
    let app = build_test_router(text_companion(&MockGenerator::replying("hi")));

    let (status, json) = send(&app, "GET", "/api/sessions/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn test_malformed_json_body_is_json_error() {
    let app = build_test_router(text_companion(&MockGenerator::replying("hi")));
    let id = create_session(&app, None).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/sessions/{id}/messages"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"text\": "))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"]["code"], "invalid_request");

    let (status, json) = send(
        &app,
        "POST",
        &format!("/api/sessions/{id}/messages"),
        Some(json!({ "words": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn test_message_turn_and_transcript() {
    let generator = MockGenerator::replying("That sounds hard. What helped last time?");
    let app = build_test_router(text_companion(&generator));
    let id = create_session(&app, Some(json!({ "current_mood": "Stressed / Overwhelmed" }))).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/api/sessions/{id}/messages"),
        Some(json!({ "text": "I had a rough day at work" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["route"], "generated");
    assert_eq!(json["reply"], "That sounds hard. What helped last time?");
    assert_eq!(json["used_journal"], false);
    assert_eq!(generator.calls(), 1);

    let (status, json) = send(&app, "GET", &format!("/api/sessions/{id}/transcript"), None).await;
    assert_eq!(status, StatusCode::OK);
    let turns = json["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["role"], "user");
    assert_eq!(turns[0]["text"], "I had a rough day at work");
    assert_eq!(turns[1]["role"], "assistant");
}

#[tokio::test]
async fn test_crisis_message_skips_generation() {
    let generator = MockGenerator::replying("unused");
    let app = build_test_router(text_companion(&generator));
    let id = create_session(&app, None).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/api/sessions/{id}/messages"),
        Some(json!({ "text": "I want to end my life" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["route"], "crisis");
    assert!(json["reply"].as_str().unwrap().contains("988"));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_generation_failure_still_records_turn() {
    let app = build_test_router(text_companion(&MockGenerator::failing()));
    let id = create_session(&app, None).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/api/sessions/{id}/messages"),
        Some(json!({ "text": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["route"], "failed");
    assert!(!json["reply"].as_str().unwrap().is_empty());

    let (_, json) = send(&app, "GET", &format!("/api/sessions/{id}/transcript"), None).await;
    assert_eq!(json["turns"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_empty_message_is_bad_request() {
    let app = build_test_router(text_companion(&MockGenerator::replying("hi")));
    let id = create_session(&app, None).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/api/sessions/{id}/messages"),
        Some(json!({ "text": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = build_test_router(text_companion(&MockGenerator::replying("hi")));
    let missing = uuid::Uuid::new_v4();

    let (status, json) = send(
        &app,
        "POST",
        &format!("/api/sessions/{missing}/messages"),
        Some(json!({ "text": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_deleted_session_is_gone() {
    let app = build_test_router(text_companion(&MockGenerator::replying("hi")));
    let id = create_session(&app, None).await;

    let (status, _) = send(&app, "DELETE", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_journal_upload_is_anonymized_and_used() {
    let generator = MockGenerator::replying("Thanks for trusting me with that.");
    let app = build_test_router(text_companion(&generator));
    let id = create_session(&app, None).await;

    let journal = "Exams again. Reach me at jane.doe@example.com or 555-123-4567. \
                   Exams make me nervous, exams every week.";
    let (status, json) = send_raw(
        &app,
        &format!("/api/sessions/{id}/journal?filename=week.txt"),
        journal.as_bytes().to_vec(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["filename"], "week.txt");
    assert_eq!(json["empty"], false);
    assert_eq!(
        json["redactions"],
        json!(["Email Addresses", "Phone Numbers"])
    );
    assert_eq!(json["word_cloud"][0]["word"], "exams");

    let (_, json) = send(
        &app,
        "POST",
        &format!("/api/sessions/{id}/messages"),
        Some(json!({ "text": "I keep worrying" })),
    )
    .await;
    assert_eq!(json["used_journal"], true);

    let (_, prompt) = generator.last_prompt().unwrap();
    assert!(prompt.contains("[EMAIL REDACTED]"));
    assert!(!prompt.contains("jane.doe@example.com"));

    let (status, _) = send(&app, "DELETE", &format!("/api/sessions/{id}/journal"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, json) = send(
        &app,
        "POST",
        &format!("/api/sessions/{id}/messages"),
        Some(json!({ "text": "still worrying" })),
    )
    .await;
    assert_eq!(json["used_journal"], false);
}

#[tokio::test]
async fn test_empty_journal_upload_is_bad_request() {
    let app = build_test_router(text_companion(&MockGenerator::replying("hi")));
    let id = create_session(&app, None).await;

    let (status, _) = send_raw(&app, &format!("/api/sessions/{id}/journal"), Vec::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_large_journal_upload_is_accepted() {
    let app = build_test_router(text_companion(&MockGenerator::replying("hi")));
    let id = create_session(&app, None).await;

    let entry = "Today was long but I went for a walk and felt calmer afterwards. ";
    let journal = entry.repeat(3 * 1024 * 1024 / entry.len() + 1);
    assert!(journal.len() > 3 * 1024 * 1024);

    let (status, json) = send_raw(
        &app,
        &format!("/api/sessions/{id}/journal?filename=year.txt"),
        journal.into_bytes(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["empty"], false);
    assert_eq!(json["filename"], "year.txt");
}

#[tokio::test]
async fn test_upload_over_limit_is_json_error() {
    let server = ServerConfig {
        max_upload_bytes: 1024,
        ..ServerConfig::default()
    };
    let app = build_limited_router(text_companion(&MockGenerator::replying("hi")), &server);
    let id = create_session(&app, None).await;

    let (status, json) = send_raw(
        &app,
        &format!("/api/sessions/{id}/journal"),
        vec![b'a'; 4096],
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["error"]["code"], "payload_too_large");

    let (status, json) = send_raw(&app, &format!("/api/sessions/{id}/voice"), vec![0; 4096]).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["error"]["code"], "payload_too_large");

    let (_, json) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(json["has_journal"], false);
}

#[tokio::test]
async fn test_session_cap_drops_least_recently_active() {
    let server = ServerConfig {
        max_sessions: 2,
        ..ServerConfig::default()
    };
    let app = build_limited_router(text_companion(&MockGenerator::replying("hi")), &server);

    let first = create_session(&app, None).await;
    let second = create_session(&app, None).await;
    let (status, _) = send(&app, "GET", &format!("/api/sessions/{first}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let third = create_session(&app, None).await;

    let (_, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(json["sessions"], 2);
    let (status, _) = send(&app, "GET", &format!("/api/sessions/{second}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    for id in [first, third] {
        let (status, _) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_recommendations_follow_mood() {
    let app = build_test_router(text_companion(&MockGenerator::replying("hi")));
    let id = create_session(&app, Some(json!({ "current_mood": "Sad / Low" }))).await;

    let (status, json) = send(
        &app,
        "GET",
        &format!("/api/sessions/{id}/recommendations"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["action"]["kind"], "found");
    assert_eq!(json["music"]["kind"], "found");

    let active: Vec<_> = json["compass"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|line| line["active"] == true)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["mood"], "Sad");
}

#[tokio::test]
async fn test_joke_uses_avatar() {
    let generator = MockGenerator::replying("Why did the panda nap? Bamboo-zled.");
    let app = build_test_router(text_companion(&generator));
    let id = create_session(&app, Some(json!({ "avatar": "Pandy" }))).await;

    let (status, json) = send(&app, "POST", &format!("/api/sessions/{id}/joke"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["joke"], "Why did the panda nap? Bamboo-zled.");
    assert_eq!(json["emoji"], "🐼");

    let (_, json) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(json["turns"], 0);
    assert_eq!(json["last_joke"], "Why did the panda nap? Bamboo-zled.");
}

#[tokio::test]
async fn test_calm_quest_flow() {
    let generator = MockGenerator::replying("You did something kind for yourself.");
    let app = build_test_router(text_companion(&generator));
    let id = create_session(&app, None).await;
    let quest = format!("/api/sessions/{id}/calm-quest");

    let (status, json) = send(&app, "POST", &quest, Some(json!({ "breath_seconds": 5 }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["step"], "breathing");
    assert_eq!(json["breath_seconds"], 10);
    assert_eq!(json["cues"].as_array().unwrap().len(), 10);

    let (status, json) = send(
        &app,
        "PATCH",
        &quest,
        Some(json!({ "move": "next", "seen": "a lamp, a mug, the sky" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["step"], "grounding");

    let (_, json) = send(
        &app,
        "PATCH",
        &quest,
        Some(json!({ "move": "next", "need": "a glass of water" })),
    )
    .await;
    assert_eq!(json["step"], "journal");

    let (status, json) = send(&app, "POST", &format!("{quest}/finish"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user_text"], "🎮 Completed Calm Quest");
    assert_eq!(json["reply"], "You did something kind for yourself.");

    let (_, prompt) = generator.last_prompt().unwrap();
    assert!(prompt.contains("3 things I see: a lamp, a mug, the sky"));
    assert!(prompt.contains("Right now I need: a glass of water"));

    let (status, _) = send(&app, "POST", &format!("{quest}/finish"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_voice_turn_without_stt_is_unavailable() {
    let app = build_test_router(text_companion(&MockGenerator::replying("hi")));
    let id = create_session(&app, None).await;

    let (status, json) = send_raw(&app, &format!("/api/sessions/{id}/voice"), speech_wav()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "not_configured");
}

#[tokio::test]
async fn test_voice_turn_and_spoken_reply() {
    let generator = MockGenerator::replying("Let's take a slow breath together.");
    let app = build_test_router(voice_companion(&generator, "I feel anxious", false));
    let id = create_session(&app, Some(json!({ "speak_replies": true }))).await;

    let (status, _) = send(&app, "GET", &format!("/api/sessions/{id}/speech"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send_raw(&app, &format!("/api/sessions/{id}/voice"), speech_wav()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user_text"], "I feel anxious");
    assert!(json["audio_error"].is_null());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/sessions/{id}/speech"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    let audio = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&audio[..], b"ID3:Let's take a slow breath together.");
}

#[tokio::test]
async fn test_silent_voice_turn_is_unprocessable() {
    let generator = MockGenerator::replying("unused");
    let app = build_test_router(voice_companion(&generator, "unused", false));
    let id = create_session(&app, None).await;

    let (status, json) =
        send_raw(&app, &format!("/api/sessions/{id}/voice"), common::silent_wav()).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"]["code"], "transcription_failed");
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_synthesize_endpoint() {
    let generator = MockGenerator::replying("unused");
    let app = build_test_router(voice_companion(&generator, "unused", true));

    let (status, json) = send(
        &app,
        "POST",
        "/api/voice/synthesize",
        Some(json!({ "text": "hello there" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"]["code"], "synthesis_failed");
}
