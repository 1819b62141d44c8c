//! Community endpoints. Browsing is open; posting, voting and requests
//! need a signed-in user.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::info;

use super::forums::{Author, DEFAULT_AVATAR, ForumPost, PostForm, VoteDirection};
use super::mentors::{Mentor, request_message};
use super::testimonials::{THANK_YOU, Testimonial, TestimonialForm};
use crate::auth::{Capability, authorize};
use crate::error::ApiError;
use crate::notify::{Notice, Notifier};
use crate::server::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/forums", get(list_posts).post(create_post))
        .route("/api/forums/{id}/vote", post(vote))
        .route("/api/mentors", get(list_mentors))
        .route("/api/mentors/{id}/request", post(request_mentorship))
        .route("/api/testimonials", get(list_testimonials).post(submit_testimonial))
}

#[derive(Debug, Deserialize)]
struct ForumQuery {
    #[serde(default = "all")]
    category: String,
    #[serde(default)]
    search: String,
}

#[derive(Debug, Deserialize)]
struct MentorQuery {
    #[serde(default = "all")]
    industry: String,
    #[serde(default)]
    search: String,
}

fn all() -> String {
    "all".to_string()
}

#[derive(Debug, Deserialize)]
struct VoteRequest {
    direction: VoteDirection,
}

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ForumQuery>,
) -> impl IntoResponse {
    let board = state.forums.read().await;
    Json(serde_json::json!({
        "categories": board.categories(),
        "posts": board.filter(&query.category, &query.search),
    }))
}

async fn create_post(
    State(state): State<AppState>,
    Json(form): Json<PostForm>,
) -> Result<(StatusCode, Json<ForumPost>), ApiError> {
    let user = authorize(&state.mirror.snapshot().await, Capability::ParticipateInCommunity)?;
    let author = Author {
        id: user.id.clone(),
        name: user.display_name(),
        avatar: user
            .avatar_url
            .clone()
            .unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
    };
    let post = state.forums.write().await.create(author, &form)?.clone();
    info!(user_id = %user.id, post_id = %post.id, "Forum post created");
    state
        .notices
        .notify(Notice::success("Post created successfully!"));
    Ok((StatusCode::CREATED, Json(post)))
}

async fn vote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<ForumPost>, ApiError> {
    authorize(&state.mirror.snapshot().await, Capability::ParticipateInCommunity)?;
    let mut board = state.forums.write().await;
    let post = board
        .vote(&id, req.direction)
        .ok_or_else(|| ApiError::not_found("Post not found"))?;
    Ok(Json(post.clone()))
}

async fn list_mentors(
    State(state): State<AppState>,
    Query(query): Query<MentorQuery>,
) -> impl IntoResponse {
    let mentors: Vec<Mentor> = state.mentors.filter(&query.industry, &query.search);
    Json(serde_json::json!({
        "industries": state.mentors.industries(),
        "mentors": mentors,
    }))
}

async fn request_mentorship(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = authorize(&state.mirror.snapshot().await, Capability::ParticipateInCommunity)?;
    let mentor = state
        .mentors
        .get(&id)
        .ok_or_else(|| ApiError::not_found("Mentor not found"))?;
    let message = request_message(mentor);
    info!(user_id = %user.id, mentor_id = %mentor.id, "Mentorship requested");
    state.notices.notify(Notice::success(message.clone()));
    Ok(Json(serde_json::json!({ "message": message })))
}

async fn list_testimonials(State(state): State<AppState>) -> Json<Vec<Testimonial>> {
    Json(state.testimonials.read().await.entries().to_vec())
}

async fn submit_testimonial(
    State(state): State<AppState>,
    Json(form): Json<TestimonialForm>,
) -> Result<(StatusCode, Json<Testimonial>), ApiError> {
    let user = authorize(&state.mirror.snapshot().await, Capability::ParticipateInCommunity)?;
    let entry = state.testimonials.write().await.submit(&user, &form)?.clone();
    state.notices.notify(Notice::success(THANK_YOU));
    Ok((StatusCode::CREATED, Json(entry)))
}
