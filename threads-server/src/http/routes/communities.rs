//! Community endpoints

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::http::error::ApiError;
use crate::models::Community;
use crate::state::AppState;

/// Community registration request
#[derive(Deserialize)]
pub struct CommunityRequest {
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub bio: String,
    pub image: String,
}

/// PUT /communities/{external_id} - register or update a community
async fn put_community(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
    Json(req): Json<CommunityRequest>,
) -> Result<Json<Community>, ApiError> {
    let community = state
        .actions()
        .upsert_community(&external_id, &req.username, &req.name, &req.bio, &req.image)
        .await?;

    Ok(Json(community))
}

/// GET /communities/{external_id}
async fn get_community(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<Json<Community>, ApiError> {
    match state.actions().get_community(&external_id).await? {
        Some(community) => Ok(Json(community)),
        None => Err(ApiError::NotFound {
            resource: "community",
            id: external_id,
        }),
    }
}

/// Community routes
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/communities/{external_id}",
        get(get_community).put(put_community),
    )
}
