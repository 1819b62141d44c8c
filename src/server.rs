//! Application state, router assembly, dashboard and the notice WebSocket.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderValue,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

use crate::assessment::{self, CareerMatch, QuizRunner, career_catalog, career_interest_questions};
use crate::auth::{self, SessionMirror, SessionState};
use crate::backend::{AuthService, RecordStore};
use crate::community::{self, ForumBoard, MentorDirectory, TestimonialWall};
use crate::educator;
use crate::learning::{self, CareerPaths, CourseCatalog};
use crate::error::{AccessError, ApiError};
use crate::notify::{Notice, NoticeHub, Notifier};
use crate::store::SettingsStore;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthService>,
    pub records: Arc<dyn RecordStore>,
    pub mirror: Arc<SessionMirror>,
    pub quiz: Arc<RwLock<QuizRunner>>,
    pub forums: Arc<RwLock<ForumBoard>>,
    pub mentors: Arc<MentorDirectory>,
    pub testimonials: Arc<RwLock<TestimonialWall>>,
    pub courses: Arc<CourseCatalog>,
    pub careers: Arc<CareerPaths>,
    pub notices: Arc<NoticeHub>,
}

impl AppState {
    pub fn new(
        auth: Arc<dyn AuthService>,
        records: Arc<dyn RecordStore>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        let notices = NoticeHub::new();
        let notifier: Arc<dyn Notifier> = notices.clone();
        Self {
            mirror: Arc::new(SessionMirror::new(Arc::clone(&auth), settings)),
            auth,
            records,
            quiz: Arc::new(RwLock::new(QuizRunner::new(
                career_interest_questions(),
                notifier,
            ))),
            forums: Arc::new(RwLock::new(ForumBoard::seeded())),
            mentors: Arc::new(MentorDirectory::seeded()),
            testimonials: Arc::new(RwLock::new(TestimonialWall::seeded())),
            courses: Arc::new(CourseCatalog::seeded()),
            careers: Arc::new(CareerPaths::seeded()),
            notices,
        }
    }

    /// Drop quiz progress as soon as the mirrored identity changes, including
    /// sign-outs and expiries seen only by the session listener.
    pub fn spawn_quiz_guard(&self) -> JoinHandle<()> {
        let mut identity = self.mirror.watch_identity();
        let quiz = Arc::clone(&self.quiz);
        tokio::spawn(async move {
            while identity.changed().await.is_ok() {
                let current = identity.borrow_and_update().clone();
                let mut quiz = quiz.write().await;
                if quiz.owner().is_some() && quiz.owner() != current.as_deref() {
                    info!(previous = ?quiz.owner(), "Identity changed; discarding quiz progress");
                    quiz.release();
                }
            }
            debug!("Identity watch closed");
        })
    }
}

/// Every route, with state attached.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/dashboard", get(dashboard))
        .route("/ws/notices", get(ws_handler))
        .merge(auth::routes::routes())
        .merge(assessment::routes::routes())
        .merge(educator::routes::routes())
        .merge(community::routes::routes())
        .merge(learning::routes::routes())
        .with_state(state)
}

/// Router wrapped with CORS for the configured origins (any when empty).
pub fn app(state: AppState, allowed_origins: &[String]) -> Router {
    router(state).layer(ServiceBuilder::new().layer(cors_layer(allowed_origins)))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return base.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(origins)
}

// ── Health ──────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "waypoint",
    }))
}

// ── Dashboard ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Dashboard {
    greeting: String,
    display_name: String,
    role: auth::UserRole,
    blurb: &'static str,
    privileges: &'static [&'static str],
    top_matches: Vec<CareerMatch>,
}

async fn dashboard(State(state): State<AppState>) -> Result<Json<Dashboard>, ApiError> {
    let snapshot = state.mirror.snapshot().await;
    let user = snapshot.user().ok_or(AccessError::Unauthenticated)?;
    Ok(Json(Dashboard {
        greeting: format!("Welcome, {}", user.greeting_name()),
        display_name: user.display_name(),
        role: user.role,
        blurb: user.role.dashboard_blurb(),
        privileges: user.role.privileges(),
        top_matches: career_catalog().into_iter().take(3).collect(),
    }))
}

// ── Notice WebSocket ────────────────────────────────────────────────

/// Frames pushed to notice subscribers.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsMessage {
    /// Sent on connect and after a lag.
    Session { session: SessionState },
    Notice {
        #[serde(flatten)]
        notice: Notice,
    },
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    debug!("Notice WebSocket client connecting");
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn send_json(socket: &mut WebSocket, msg: &WsMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to encode WS frame");
            true
        }
    }
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    // Subscribe before the snapshot so nothing published in between is lost.
    let mut rx = state.notices.subscribe();
    let hello = WsMessage::Session {
        session: state.mirror.snapshot().await,
    };
    if !send_json(&mut socket, &hello).await {
        warn!("Failed to send initial session, client disconnected");
        return;
    }
    info!("Notice WebSocket client connected");

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(notice) => {
                        if !send_json(&mut socket, &WsMessage::Notice { notice }).await {
                            debug!("Client disconnected during send");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "WS client lagged behind notices");
                        let sync = WsMessage::Session {
                            session: state.mirror.snapshot().await,
                        };
                        if !send_json(&mut socket, &sync).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Notice channel closed");
                        break;
                    }
                }
            }

            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    info!("Notice WebSocket connection closed");
}
