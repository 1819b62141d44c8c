//! Account endpoints: login, registration, logout, session and profile.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Serialize;
use tracing::info;

use super::{LoginForm, ProfileUpdate, RegistrationForm, SessionState, User};
use crate::backend::{SessionEvent, SignUpAttributes};
use crate::error::{AccessError, ApiError, BackendError};
use crate::notify::{Notice, Notifier};
use crate::server::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/session", get(session))
        .route("/api/auth/profile", patch(update_profile))
        .route("/api/privileges", get(privileges))
}

/// Outcome of a registration.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum RegistrationOutcome {
    SignedIn { user: User },
    ConfirmationRequired { message: &'static str },
}

async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginForm>,
) -> Result<Json<User>, ApiError> {
    let (email, password) = form.validate()?;
    let session = state.auth.sign_in(&email, &password).await?;
    let user = state
        .mirror
        .apply(SessionEvent::SignedIn(session))
        .await?
        .ok_or(BackendError::NoSession)?;
    state.notices.notify(Notice::success("Successfully logged in"));
    Ok(Json(user))
}

async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegistrationForm>,
) -> Result<impl IntoResponse, ApiError> {
    let registration = form.validate()?;
    let attributes = SignUpAttributes {
        username: registration.username,
        role: registration.role,
    };
    let session = state
        .auth
        .sign_up(&registration.email, &registration.password, &attributes)
        .await?;

    match session {
        Some(session) => {
            let user = state
                .mirror
                .apply(SessionEvent::SignedIn(session))
                .await?
                .ok_or(BackendError::NoSession)?;
            info!(user_id = %user.id, role = %user.role, "Account created");
            state
                .notices
                .notify(Notice::success("Account created successfully"));
            Ok((StatusCode::CREATED, Json(RegistrationOutcome::SignedIn { user })))
        }
        None => {
            let message = "Please check your email to confirm your account before logging in.";
            state.notices.notify(Notice::info(message));
            Ok((
                StatusCode::ACCEPTED,
                Json(RegistrationOutcome::ConfirmationRequired { message }),
            ))
        }
    }
}

async fn logout(State(state): State<AppState>) -> Result<Json<SessionState>, ApiError> {
    state.auth.sign_out().await?;
    state.mirror.apply(SessionEvent::SignedOut).await?;
    // In-progress quiz state belongs to the session that just ended.
    state.quiz.write().await.release();
    state.notices.notify(Notice::info("You have been logged out"));
    Ok(Json(state.mirror.snapshot().await))
}

async fn session(State(state): State<AppState>) -> Json<SessionState> {
    Json(state.mirror.snapshot().await)
}

async fn update_profile(
    State(state): State<AppState>,
    Json(fields): Json<ProfileUpdate>,
) -> Result<Json<User>, ApiError> {
    let user = state.mirror.update_profile(&fields).await?;
    state
        .notices
        .notify(Notice::success("Profile updated successfully"));
    Ok(Json(user))
}

async fn privileges(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.mirror.snapshot().await;
    let user = snapshot.user().ok_or(AccessError::Unauthenticated)?;
    Ok(Json(serde_json::json!({
        "role": user.role,
        "privileges": user.role.privileges(),
    })))
}
