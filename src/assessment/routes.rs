//! Quiz endpoints. Every call goes through the role boundary first.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLockWriteGuard;
use tracing::{info, warn};

use super::history::{AssessmentRecord, CAREER_INTERESTS, NewAssessment};
use super::matches::{CareerMatch, career_catalog};
use super::question::Question;
use super::quiz::{Advance, QuizRunner, QuizState};
use crate::auth::{Capability, User, authorize};
use crate::error::ApiError;
use crate::notify::{Notice, Notifier};
use crate::server::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/assessment", get(show))
        .route("/api/assessment/answer", post(answer))
        .route("/api/assessment/next", post(next))
        .route("/api/assessment/retake", post(retake))
        .route("/api/assessment/results", get(results))
        .route("/api/assessment/history", get(history))
}

/// What the quiz screen renders.
#[derive(Debug, Serialize)]
pub struct QuizView {
    pub state: QuizState,
    pub total: usize,
    pub current: Option<Question>,
    pub answers: Vec<Option<String>>,
}

impl From<&QuizRunner> for QuizView {
    fn from(quiz: &QuizRunner) -> Self {
        Self {
            state: quiz.state(),
            total: quiz.questions().len(),
            current: quiz.current_question().cloned(),
            answers: quiz.answers().to_vec(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnswerRequest {
    index: usize,
    value: String,
}

#[derive(Debug, Serialize)]
struct AdvanceResponse {
    outcome: Advance,
    quiz: QuizView,
}

#[derive(Debug, Serialize)]
struct ResultsResponse {
    answers: Vec<String>,
    matches: Vec<CareerMatch>,
}

#[derive(Debug, Serialize)]
struct HistoryEntry {
    name: String,
    #[serde(flatten)]
    record: AssessmentRecord,
}

/// The quiz bound to `user`; another user's answers are dropped first.
async fn quiz_for<'a>(state: &'a AppState, user: &User) -> RwLockWriteGuard<'a, QuizRunner> {
    let mut quiz = state.quiz.write().await;
    if quiz.claim(&user.id) {
        info!(user_id = %user.id, "Discarded previous user's quiz progress");
    }
    quiz
}

async fn show(State(state): State<AppState>) -> Result<Json<QuizView>, ApiError> {
    let user = authorize(&state.mirror.snapshot().await, Capability::TakeAssessment)?;
    let quiz = quiz_for(&state, &user).await;
    Ok(Json(QuizView::from(&*quiz)))
}

async fn answer(
    State(state): State<AppState>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<QuizView>, ApiError> {
    let user = authorize(&state.mirror.snapshot().await, Capability::TakeAssessment)?;
    let mut quiz = quiz_for(&state, &user).await;
    quiz.select_answer(req.index, &req.value)?;
    Ok(Json(QuizView::from(&*quiz)))
}

async fn next(State(state): State<AppState>) -> Result<Json<AdvanceResponse>, ApiError> {
    let user = authorize(&state.mirror.snapshot().await, Capability::TakeAssessment)?;
    let (outcome, view, responses) = {
        let mut quiz = quiz_for(&state, &user).await;
        let outcome = quiz.advance();
        let responses = match outcome {
            Advance::Completed => quiz.completed_answers().ok(),
            _ => None,
        };
        (outcome, QuizView::from(&*quiz), responses)
    };

    if let Some(responses) = responses {
        submit(&state, &user, responses).await;
    }
    Ok(Json(AdvanceResponse {
        outcome,
        quiz: view,
    }))
}

/// Best-effort save of a finished quiz; failure never blocks the results.
async fn submit(state: &AppState, user: &User, responses: Vec<String>) {
    let record = NewAssessment {
        user_id: user.id.clone(),
        assessment_type: CAREER_INTERESTS.to_string(),
        responses,
        completed_at: Utc::now(),
    };
    match state.records.insert_assessment(&record).await {
        Ok(saved) => info!(user_id = %user.id, assessment_id = %saved.id, "Assessment saved"),
        Err(e) => {
            warn!(user_id = %user.id, error = %e, "Failed to save assessment");
            state.notices.notify(Notice::error(format!(
                "Your results could not be saved. {}",
                e.user_message()
            )));
        }
    }
}

async fn retake(State(state): State<AppState>) -> Result<Json<QuizView>, ApiError> {
    let user = authorize(&state.mirror.snapshot().await, Capability::TakeAssessment)?;
    let mut quiz = quiz_for(&state, &user).await;
    quiz.reset();
    Ok(Json(QuizView::from(&*quiz)))
}

async fn results(State(state): State<AppState>) -> Result<Json<ResultsResponse>, ApiError> {
    let user = authorize(&state.mirror.snapshot().await, Capability::ViewResults)?;
    let answers = quiz_for(&state, &user).await.completed_answers()?;
    Ok(Json(ResultsResponse {
        answers,
        matches: career_catalog(),
    }))
}

async fn history(State(state): State<AppState>) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let user = authorize(&state.mirror.snapshot().await, Capability::ViewResults)?;
    let records = state.records.list_assessments(&user.id).await?;
    Ok(Json(
        records
            .into_iter()
            .map(|record| HistoryEntry {
                name: record.display_name(),
                record,
            })
            .collect(),
    ))
}
