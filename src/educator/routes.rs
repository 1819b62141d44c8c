//! Question bank and template endpoints.
//!
//! Educators manage their own records. Administrators may list everything
//! but cannot modify it.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Deserialize;
use tracing::info;

use super::questions::{BankQuestion, QuestionForm};
use super::templates::{AssessmentTemplate, TemplateForm, publish_message};
use crate::auth::{Capability, SessionState, User, authorize};
use crate::backend::Scope;
use crate::error::{AccessError, ApiError};
use crate::notify::{Notice, Notifier};
use crate::server::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/questions", get(list_questions).post(create_question))
        .route("/api/questions/{id}", delete(delete_question))
        .route("/api/templates", get(list_templates).post(create_template))
        .route("/api/templates/questions", get(pick_questions))
        .route("/api/templates/{id}/publish", post(toggle_publish))
        .route("/api/templates/{id}", delete(delete_template))
}

/// Who may list records under `manage`, and whether they see everyone's.
fn listing_access(session: &SessionState, manage: Capability) -> Result<(User, bool), AccessError> {
    match authorize(session, manage) {
        Ok(user) => Ok((user, false)),
        Err(forbidden @ AccessError::Forbidden { .. }) => {
            authorize(session, Capability::ReviewAllContent)
                .map(|user| (user, true))
                .map_err(|_| forbidden)
        }
        Err(e) => Err(e),
    }
}

fn scope_for(user: &User, all: bool) -> Scope<'_> {
    if all { Scope::All } else { Scope::Owner(&user.id) }
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: String,
}

// ── Questions ───────────────────────────────────────────────────────

async fn list_questions(
    State(state): State<AppState>,
) -> Result<Json<Vec<BankQuestion>>, ApiError> {
    let (user, all) = listing_access(&state.mirror.snapshot().await, Capability::ManageOwnQuestions)?;
    let questions = state.records.list_questions(scope_for(&user, all)).await?;
    Ok(Json(questions))
}

async fn create_question(
    State(state): State<AppState>,
    Json(form): Json<QuestionForm>,
) -> Result<impl IntoResponse, ApiError> {
    let user = authorize(&state.mirror.snapshot().await, Capability::ManageOwnQuestions)?;
    let draft = form.validate()?;
    let question = state.records.insert_question(&user.id, &draft).await?;
    info!(user_id = %user.id, question_id = %question.id, "Question created");
    state
        .notices
        .notify(Notice::success("Question created successfully"));
    Ok((StatusCode::CREATED, Json(question)))
}

async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user = authorize(&state.mirror.snapshot().await, Capability::ManageOwnQuestions)?;
    let own = state.records.list_questions(Scope::Owner(&user.id)).await?;
    if !own.iter().any(|q| q.id == id) {
        return Err(ApiError::not_found("Question not found"));
    }
    state.records.delete_question(&id).await?;
    info!(user_id = %user.id, question_id = %id, "Question deleted");
    state
        .notices
        .notify(Notice::success("Question deleted successfully"));
    Ok(StatusCode::NO_CONTENT)
}

// ── Templates ───────────────────────────────────────────────────────

async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<AssessmentTemplate>>, ApiError> {
    let (user, all) = listing_access(&state.mirror.snapshot().await, Capability::ManageOwnTemplates)?;
    let templates = state.records.list_templates(scope_for(&user, all)).await?;
    Ok(Json(templates))
}

async fn create_template(
    State(state): State<AppState>,
    Json(form): Json<TemplateForm>,
) -> Result<impl IntoResponse, ApiError> {
    let user = authorize(&state.mirror.snapshot().await, Capability::ManageOwnTemplates)?;
    let bank = state.records.list_questions(Scope::Owner(&user.id)).await?;
    let draft = form.validate(&bank)?;
    let template = state.records.insert_template(&user.id, &draft).await?;
    info!(user_id = %user.id, template_id = %template.id, "Template created");
    state
        .notices
        .notify(Notice::success("Template created successfully"));
    Ok((StatusCode::CREATED, Json(template)))
}

/// The creator's bank filtered for the template question picker.
async fn pick_questions(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<BankQuestion>>, ApiError> {
    let user = authorize(&state.mirror.snapshot().await, Capability::ManageOwnTemplates)?;
    let bank = state.records.list_questions(Scope::Owner(&user.id)).await?;
    let search = query.search.trim();
    Ok(Json(
        bank.into_iter()
            .filter(|q| q.matches_search(search))
            .collect(),
    ))
}

async fn own_template(
    state: &AppState,
    user: &User,
    id: &str,
) -> Result<AssessmentTemplate, ApiError> {
    state
        .records
        .list_templates(Scope::Owner(&user.id))
        .await?
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| ApiError::not_found("Template not found"))
}

async fn toggle_publish(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AssessmentTemplate>, ApiError> {
    let user = authorize(&state.mirror.snapshot().await, Capability::ManageOwnTemplates)?;
    let current = own_template(&state, &user, &id).await?;
    let updated = state
        .records
        .set_template_published(&id, !current.published)
        .await?;
    state
        .notices
        .notify(Notice::success(publish_message(updated.published)));
    Ok(Json(updated))
}

async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user = authorize(&state.mirror.snapshot().await, Capability::ManageOwnTemplates)?;
    own_template(&state, &user, &id).await?;
    state.records.delete_template(&id).await?;
    info!(user_id = %user.id, template_id = %id, "Template deleted");
    state
        .notices
        .notify(Notice::success("Template deleted successfully"));
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserRole;

    fn session(role: UserRole) -> SessionState {
        SessionState::Authenticated(User {
            id: "u".into(),
            username: "u".into(),
            email: "u@example.com".into(),
            role,
            first_name: None,
            last_name: None,
            avatar_url: None,
        })
    }

    #[test]
    fn listing_scope_by_role() {
        let (_, all) = listing_access(&session(UserRole::Educator), Capability::ManageOwnQuestions).unwrap();
        assert!(!all);
        let (_, all) =
            listing_access(&session(UserRole::Administrator), Capability::ManageOwnQuestions).unwrap();
        assert!(all);
        let err = listing_access(&session(UserRole::Student), Capability::ManageOwnTemplates).unwrap_err();
        assert!(matches!(err, AccessError::Forbidden { .. }));
        let err = listing_access(&SessionState::Unauthenticated, Capability::ManageOwnQuestions)
            .unwrap_err();
        assert_eq!(err, AccessError::Unauthenticated);
    }
}
