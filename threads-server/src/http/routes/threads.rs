//! Thread endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::http::error::ApiError;
use crate::http::extractors::{Identity, ThreadId};
use crate::models::{Thread, ThreadNode};
use crate::state::AppState;

/// Create thread request
#[derive(Deserialize)]
pub struct CreateThreadRequest {
    pub text: String,
    /// External id of the community to post in
    pub community: Option<String>,
    /// Page to revalidate (default: `/`)
    pub path: Option<String>,
}

/// Reply request
#[derive(Deserialize)]
pub struct ReplyRequest {
    pub text: String,
    /// Page to revalidate (default: `/thread/{id}`)
    pub path: Option<String>,
}

/// POST /threads - post a top-level thread as the caller
async fn create_thread(
    State(state): State<AppState>,
    Identity(author): Identity,
    Json(req): Json<CreateThreadRequest>,
) -> Result<(StatusCode, Json<Thread>), ApiError> {
    let path = req.path.as_deref().unwrap_or("/");
    let thread = state
        .actions()
        .create_thread(&req.text, &author, req.community.as_deref(), path)
        .await?;

    Ok((StatusCode::CREATED, Json(thread)))
}

/// GET /threads/{id} - thread with two levels of replies
async fn get_thread(
    State(state): State<AppState>,
    ThreadId(id): ThreadId,
) -> Result<Json<ThreadNode>, ApiError> {
    let thread = state
        .actions()
        .fetch_thread_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            resource: "thread",
            id: id.to_string(),
        })?;

    Ok(Json(thread))
}

/// POST /threads/{id}/replies - reply as the caller
async fn add_reply(
    State(state): State<AppState>,
    ThreadId(parent): ThreadId,
    Identity(author): Identity,
    Json(req): Json<ReplyRequest>,
) -> Result<(StatusCode, Json<Thread>), ApiError> {
    let path = req
        .path
        .unwrap_or_else(|| format!("/thread/{}", parent));
    let reply = state
        .actions()
        .add_reply(parent, &req.text, &author, &path)
        .await?;

    Ok((StatusCode::CREATED, Json(reply)))
}

/// Thread routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/threads", post(create_thread))
        .route("/threads/{id}", get(get_thread))
        .route("/threads/{id}/replies", post(add_reply))
}
