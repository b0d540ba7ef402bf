//! Health, capability and option endpoints

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;
use crate::companion::Capabilities;
use crate::session::{Avatar, FocusArea, Mood};

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub sessions: usize,
}

/// Choices the UI offers in its selectors
#[derive(Serialize)]
pub struct OptionsResponse {
    pub focus_areas: Vec<&'static str>,
    pub moods: Vec<&'static str>,
    pub avatars: Vec<AvatarOption>,
}

#[derive(Serialize)]
pub struct AvatarOption {
    pub name: &'static str,
    pub emoji: &'static str,
    pub style: &'static str,
}

/// Liveness check
async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        sessions: state.session_count().await,
    })
}

/// Which collaborators are configured
async fn capabilities(State(state): State<Arc<ApiState>>) -> Json<Capabilities> {
    Json(state.companion.capabilities())
}

async fn options() -> Json<OptionsResponse> {
    Json(OptionsResponse {
        focus_areas: FocusArea::ALL.iter().map(|f| f.label()).collect(),
        moods: Mood::ALL.iter().map(|m| m.label()).collect(),
        avatars: Avatar::ALL
            .iter()
            .map(|a| AvatarOption {
                name: a.label(),
                emoji: a.emoji(),
                style: a.joke_style(),
            })
            .collect(),
    })
}

/// Build health router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/capabilities", get(capabilities))
        .route("/api/options", get(options))
        .with_state(state)
}
