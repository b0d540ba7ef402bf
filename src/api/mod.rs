//! HTTP API server for EmoCare
//!
//! Sessions live in memory only. They are destroyed on delete, after sitting
//! idle past the configured TTL, or on shutdown.

mod error;
mod extract;
pub mod health;
pub mod sessions;
pub mod voice;

pub use error::ApiError;
pub use extract::{ApiBytes, ApiJson, ApiPath, ApiQuery};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::companion::Companion;
use crate::config::ServerConfig;
use crate::session::Session;
use crate::{Error, Result};

/// Each session behind its own lock so turns within a session are serialized
pub type SessionHandle = Arc<Mutex<Session>>;

/// Shared state for API handlers
pub struct ApiState {
    pub companion: Arc<Companion>,
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
    session_ttl: Duration,
    max_sessions: usize,
    max_upload_bytes: usize,
}

impl ApiState {
    /// State with the default server limits
    #[must_use]
    pub fn new(companion: Arc<Companion>) -> Self {
        Self::with_limits(companion, &ServerConfig::default())
    }

    /// State using the session and upload limits from `server`
    #[must_use]
    pub fn with_limits(companion: Arc<Companion>, server: &ServerConfig) -> Self {
        Self {
            companion,
            sessions: RwLock::new(HashMap::new()),
            session_ttl: server.session_ttl,
            max_sessions: server.max_sessions,
            max_upload_bytes: server.max_upload_bytes,
        }
    }

    /// Body limit for voice and journal uploads
    #[must_use]
    pub const fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Register a session and return its id
    ///
    /// At the session cap, idle sessions are evicted first, then the least
    /// recently active one.
    pub async fn insert_session(&self, session: Session) -> Uuid {
        let id = session.id;
        let mut sessions = self.sessions.write().await;

        if sessions.len() >= self.max_sessions {
            self.retain_active(&mut sessions);
        }
        if sessions.len() >= self.max_sessions {
            if let Some(oldest) = least_recently_active(&sessions) {
                sessions.remove(&oldest);
                tracing::info!(
                    session = %oldest,
                    max_sessions = self.max_sessions,
                    "session cap reached, dropped least recently active session"
                );
            }
        }

        sessions.insert(id, Arc::new(Mutex::new(session)));
        tracing::info!(session = %id, "session created");
        id
    }

    /// Look up a live session and mark it active
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionNotFound` for unknown or ended sessions
    pub async fn session(&self, id: Uuid) -> Result<SessionHandle> {
        let handle = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;

        handle.lock().await.touch();
        Ok(handle)
    }

    /// End a session, dropping its transcript and journal
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionNotFound` for unknown sessions
    pub async fn remove_session(&self, id: Uuid) -> Result<()> {
        if self.sessions.write().await.remove(&id).is_none() {
            return Err(Error::SessionNotFound(id.to_string()));
        }
        tracing::info!(session = %id, "session ended");
        Ok(())
    }

    /// Drop every session idle longer than the TTL; returns how many went
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        self.retain_active(&mut sessions)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    // A session whose lock is held is mid-request and counts as active
    fn retain_active(&self, sessions: &mut HashMap<Uuid, SessionHandle>) -> usize {
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => session.idle_for(now) < self.session_ttl,
            Err(_) => true,
        });

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(
                evicted,
                remaining = sessions.len(),
                ttl_secs = self.session_ttl.as_secs(),
                "evicted idle sessions"
            );
        }
        evicted
    }
}

fn least_recently_active(sessions: &HashMap<Uuid, SessionHandle>) -> Option<Uuid> {
    sessions
        .iter()
        .filter_map(|(id, handle)| {
            handle
                .try_lock()
                .ok()
                .map(|session| (*id, session.last_active))
        })
        .min_by_key(|(_, last_active)| *last_active)
        .map(|(id, _)| id)
}

/// Periodically drop idle sessions
fn spawn_session_sweeper(state: Arc<ApiState>) -> tokio::task::JoinHandle<()> {
    let period = state
        .session_ttl
        .clamp(Duration::from_secs(1), Duration::from_secs(60));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Skip the first immediate tick
        interval.tick().await;

        loop {
            interval.tick().await;
            state.evict_idle().await;
        }
    })
}

/// Build the router with all API routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .nest("/api/sessions", sessions::router(state.clone()))
        .nest("/api/voice", voice::router(state.clone()))
        .merge(health::router(state))
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    #[must_use]
    pub fn new(companion: Arc<Companion>, server: &ServerConfig) -> Self {
        Self {
            state: Arc::new(ApiState::with_limits(companion, server)),
            port: server.port,
            static_dir: server.static_dir.clone(),
        }
    }

    #[must_use]
    pub fn state(&self) -> Arc<ApiState> {
        self.state.clone()
    }

    /// Build the router with all routes and layers
    #[must_use]
    pub fn router(&self) -> Router {
        let mut router = router(self.state.clone());

        // Serve static files if configured
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir =
                ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        // CORS layer for cross-origin requests from frontend
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        let sweeper = spawn_session_sweeper(self.state.clone());
        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await;
        sweeper.abort();
        served.map_err(|e| Error::Config(format!("API server error: {e}")))?;

        tracing::info!("API server stopped");
        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
