//! Learning endpoints. The course catalog needs a signed-in user; career
//! paths are open.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use super::careers::parse_interests;
use super::courses::Course;
use crate::error::{AccessError, ApiError};
use crate::server::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/courses", get(list_courses))
        .route("/api/courses/recommended", get(recommended_courses))
        .route("/api/courses/workshops", get(list_workshops))
        .route("/api/courses/{id}", get(get_course))
        .route("/api/learning/careers", get(list_careers))
}

#[derive(Debug, Deserialize)]
struct CourseQuery {
    #[serde(default = "all")]
    category: String,
    #[serde(default = "all")]
    level: String,
    #[serde(default)]
    search: String,
}

#[derive(Debug, Deserialize)]
struct CareerQuery {
    /// Comma-separated interest tags.
    #[serde(default)]
    interests: String,
}

fn all() -> String {
    "all".to_string()
}

async fn require_user(state: &AppState) -> Result<(), ApiError> {
    state
        .mirror
        .snapshot()
        .await
        .user()
        .ok_or(AccessError::Unauthenticated)?;
    Ok(())
}

async fn list_courses(
    State(state): State<AppState>,
    Query(query): Query<CourseQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_user(&state).await?;
    let courses = state
        .courses
        .filter(&query.category, &query.level, &query.search);
    Ok(Json(serde_json::json!({
        "categories": state.courses.categories(),
        "levels": state.courses.levels(),
        "courses": courses,
    })))
}

async fn recommended_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, ApiError> {
    require_user(&state).await?;
    Ok(Json(state.courses.recommended()))
}

async fn list_workshops(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    require_user(&state).await?;
    Ok(Json(state.courses.workshops().to_vec()))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Course>, ApiError> {
    require_user(&state).await?;
    state
        .courses
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Course not found"))
}

async fn list_careers(
    State(state): State<AppState>,
    Query(query): Query<CareerQuery>,
) -> impl IntoResponse {
    let selected = parse_interests(&query.interests);
    Json(serde_json::json!({
        "interests": state.careers.interests(),
        "selected": selected,
        "careers": state.careers.filter_by_interests(&selected),
    }))
}
