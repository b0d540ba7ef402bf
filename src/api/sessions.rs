//! Session endpoints: context, turns, journal, jokes and the calm quest

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiBytes, ApiError, ApiJson, ApiPath, ApiQuery, ApiState};
use crate::calm_quest::{BreathCue, CalmQuest};
use crate::companion::{JournalSummary, TurnReply};
use crate::reference::{Recommendations, recommendations};
use crate::session::{Avatar, ConversationTurn, FocusArea, Mood, Session, SessionContext};

/// Build session router
pub fn router(state: Arc<ApiState>) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes());

    Router::new()
        .route("/", post(create_session))
        .route("/{id}", get(get_session).delete(delete_session))
        .route("/{id}/context", patch(update_context))
        .route("/{id}/messages", post(send_message))
        .route("/{id}/voice", post(send_voice).layer(upload_limit))
        .route("/{id}/transcript", get(transcript))
        .route("/{id}/speech", get(last_reply_audio))
        .route(
            "/{id}/journal",
            post(upload_journal)
                .layer(upload_limit)
                .delete(clear_journal),
        )
        .route("/{id}/joke", post(joke))
        .route("/{id}/recommendations", get(get_recommendations))
        .route(
            "/{id}/calm-quest",
            post(start_quest).patch(update_quest).delete(end_quest),
        )
        .route("/{id}/calm-quest/finish", post(finish_quest))
        .with_state(state)
}

/// Optional initial context for a new session
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub focus_area: Option<FocusArea>,
    pub current_mood: Option<Mood>,
    pub avatar: Option<Avatar>,
    pub speak_replies: Option<bool>,
}

/// Partial context update
#[derive(Debug, Default, Deserialize)]
pub struct ContextUpdate {
    pub focus_area: Option<FocusArea>,
    pub current_mood: Option<Mood>,
    pub avatar: Option<Avatar>,
    pub speak_replies: Option<bool>,
}

/// Session as shown to the UI; journal text itself is not echoed back
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub focus_area: FocusArea,
    pub current_mood: Mood,
    pub avatar: Avatar,
    pub avatar_emoji: &'static str,
    pub greeting: String,
    pub journal_filename: Option<String>,
    pub has_journal: bool,
    pub speak_replies: bool,
    pub turns: usize,
    pub calm_quest_active: bool,
    pub last_joke: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        let avatar = session.context.avatar;
        Self {
            id: session.id,
            focus_area: session.context.focus_area,
            current_mood: session.context.current_mood,
            avatar,
            avatar_emoji: avatar.emoji(),
            greeting: avatar.greeting(),
            journal_filename: session.journal.as_ref().and_then(|j| j.filename.clone()),
            has_journal: session.context.has_journal(),
            speak_replies: session.speak_replies,
            turns: session.transcript.len(),
            calm_quest_active: session.calm_quest.is_some(),
            last_joke: session.last_joke.clone(),
            created_at: session.created_at,
        }
    }
}

async fn create_session(
    State(state): State<Arc<ApiState>>,
    request: Option<ApiJson<CreateSessionRequest>>,
) -> (StatusCode, Json<SessionView>) {
    let request = request.map(|ApiJson(r)| r).unwrap_or_default();

    let mut session = Session::with_context(SessionContext {
        focus_area: request.focus_area.unwrap_or_default(),
        current_mood: request.current_mood.unwrap_or_default(),
        journal_excerpt: None,
        avatar: request.avatar.unwrap_or_default(),
    });
    session.speak_replies = request.speak_replies.unwrap_or(false);

    let view = SessionView::from(&session);
    state.insert_session(session).await;
    (StatusCode::CREATED, Json(view))
}

async fn get_session(
    State(state): State<Arc<ApiState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = state.session(id).await?;
    let session = handle.lock().await;
    Ok(Json(SessionView::from(&*session)))
}

async fn delete_session(
    State(state): State<Arc<ApiState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.remove_session(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_context(
    State(state): State<Arc<ApiState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<ContextUpdate>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = state.session(id).await?;
    let mut session = handle.lock().await;

    if let Some(focus_area) = update.focus_area {
        session.context.focus_area = focus_area;
    }
    if let Some(mood) = update.current_mood {
        session.context.current_mood = mood;
    }
    if let Some(avatar) = update.avatar {
        session.context.avatar = avatar;
    }
    if let Some(speak) = update.speak_replies {
        session.speak_replies = speak;
    }

    tracing::debug!(
        session = %id,
        focus = %session.context.focus_area,
        mood = %session.context.current_mood,
        "session context updated"
    );
    Ok(Json(SessionView::from(&*session)))
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

async fn send_message(
    State(state): State<Arc<ApiState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<MessageRequest>,
) -> Result<Json<TurnReply>, ApiError> {
    let handle = state.session(id).await?;
    let mut session = handle.lock().await;
    let reply = state
        .companion
        .send_message(&mut session, &request.text)
        .await?;
    Ok(Json(reply))
}

/// Raw WAV body
async fn send_voice(
    State(state): State<Arc<ApiState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiBytes(body): ApiBytes,
) -> Result<Json<TurnReply>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("empty audio data".to_string()));
    }

    let handle = state.session(id).await?;
    let mut session = handle.lock().await;
    let reply = state.companion.send_voice(&mut session, &body).await?;
    Ok(Json(reply))
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub turns: Vec<ConversationTurn>,
}

async fn transcript(
    State(state): State<Arc<ApiState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let handle = state.session(id).await?;
    let session = handle.lock().await;
    Ok(Json(TranscriptResponse {
        turns: session.transcript.render().cloned().collect(),
    }))
}

/// Audio for the most recent spoken reply
async fn last_reply_audio(
    State(state): State<Arc<ApiState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    let handle = state.session(id).await?;
    let session = handle.lock().await;
    let audio = session
        .last_reply_audio
        .clone()
        .ok_or_else(|| ApiError::NotFound("no spoken reply yet".to_string()))?;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct JournalQuery {
    pub filename: Option<String>,
}

/// Raw PDF or plain-text body
async fn upload_journal(
    State(state): State<Arc<ApiState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<JournalQuery>,
    ApiBytes(body): ApiBytes,
) -> Result<Json<JournalSummary>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("empty document".to_string()));
    }

    let handle = state.session(id).await?;

    // Extract before taking the session lock so turns are not held up
    let journal = state
        .companion
        .ingest_journal(body.to_vec(), query.filename)
        .await?;

    let mut session = handle.lock().await;
    Ok(Json(state.companion.attach_journal(&mut session, journal)))
}

async fn clear_journal(
    State(state): State<Arc<ApiState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let handle = state.session(id).await?;
    handle.lock().await.clear_journal();
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct JokeResponse {
    pub joke: String,
    pub avatar: Avatar,
    pub emoji: &'static str,
}

async fn joke(
    State(state): State<Arc<ApiState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<JokeResponse>, ApiError> {
    let handle = state.session(id).await?;
    let mut session = handle.lock().await;
    let joke = state.companion.tell_joke(&mut session).await;
    let avatar = session.context.avatar;
    Ok(Json(JokeResponse {
        joke,
        avatar,
        emoji: avatar.emoji(),
    }))
}

async fn get_recommendations(
    State(state): State<Arc<ApiState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Recommendations>, ApiError> {
    let handle = state.session(id).await?;
    let mood = handle.lock().await.context.current_mood;
    Ok(Json(recommendations(mood.label())))
}

/// Quest state plus what the UI needs to render the current step
#[derive(Debug, Serialize)]
pub struct QuestView {
    #[serde(flatten)]
    pub quest: CalmQuest,
    pub title: &'static str,
    pub cues: Vec<BreathCue>,
}

impl From<&CalmQuest> for QuestView {
    fn from(quest: &CalmQuest) -> Self {
        Self {
            quest: quest.clone(),
            title: quest.step.title(),
            cues: quest.breathing_cues(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMove {
    Next,
    Back,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuestUpdate {
    pub breath_seconds: Option<u32>,
    pub seen: Option<String>,
    pub need: Option<String>,
    #[serde(rename = "move")]
    pub step: Option<StepMove>,
}

fn apply_quest_update(quest: &mut CalmQuest, update: QuestUpdate) {
    if let Some(seconds) = update.breath_seconds {
        quest.set_breath_seconds(seconds);
    }
    if let Some(seen) = update.seen {
        quest.seen = seen;
    }
    if let Some(need) = update.need {
        quest.need = need;
    }
    match update.step {
        Some(StepMove::Next) => quest.advance(),
        Some(StepMove::Back) => quest.back(),
        None => {}
    }
}

/// Start (or restart) a calm quest
async fn start_quest(
    State(state): State<Arc<ApiState>>,
    ApiPath(id): ApiPath<Uuid>,
    update: Option<ApiJson<QuestUpdate>>,
) -> Result<(StatusCode, Json<QuestView>), ApiError> {
    let handle = state.session(id).await?;
    let mut session = handle.lock().await;

    let mut quest = CalmQuest::new();
    if let Some(ApiJson(update)) = update {
        apply_quest_update(&mut quest, update);
    }
    let view = QuestView::from(&quest);
    session.calm_quest = Some(quest);
    Ok((StatusCode::CREATED, Json(view)))
}

async fn update_quest(
    State(state): State<Arc<ApiState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<QuestUpdate>,
) -> Result<Json<QuestView>, ApiError> {
    let handle = state.session(id).await?;
    let mut session = handle.lock().await;
    let quest = session
        .calm_quest
        .as_mut()
        .ok_or_else(|| ApiError::NotFound("no calm quest in progress".to_string()))?;

    apply_quest_update(quest, update);
    Ok(Json(QuestView::from(&*quest)))
}

async fn finish_quest(
    State(state): State<Arc<ApiState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<TurnReply>, ApiError> {
    let handle = state.session(id).await?;
    let mut session = handle.lock().await;
    Ok(Json(state.companion.complete_calm_quest(&mut session).await?))
}

async fn end_quest(
    State(state): State<Arc<ApiState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let handle = state.session(id).await?;
    handle.lock().await.calm_quest = None;
    Ok(StatusCode::NO_CONTENT)
}
