//! User endpoints

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::http::error::ApiError;
use crate::http::extractors::Identity;
use crate::models::{User, UserPosts};
use crate::pages::{profile_page, Gate, ProfilePage};
use crate::state::AppState;

/// Profile save request
#[derive(Deserialize)]
pub struct ProfileRequest {
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub bio: String,
    pub image: String,
    /// Page the save came from; only `/profile/edit` is revalidated
    pub path: Option<String>,
}

fn user_not_found(identity: String) -> ApiError {
    ApiError::NotFound {
        resource: "user",
        id: identity,
    }
}

/// GET /users/me - the caller's profile
async fn get_me(
    State(state): State<AppState>,
    Identity(me): Identity,
) -> Result<Json<User>, ApiError> {
    match state.actions().get_user_by_identity(&me).await? {
        Some(user) => Ok(Json(user)),
        None => Err(user_not_found(me)),
    }
}

/// PUT /users/me - create or update the caller's profile
async fn put_me(
    State(state): State<AppState>,
    Identity(me): Identity,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .actions()
        .upsert_user_profile(
            &me,
            &req.username,
            &req.name,
            &req.bio,
            &req.image,
            req.path.as_deref(),
        )
        .await?;

    Ok(Json(user))
}

/// GET /users/{identity} - profile page, for onboarded callers
async fn get_profile(
    State(state): State<AppState>,
    Identity(me): Identity,
    Path(identity): Path<String>,
) -> Result<Json<ProfilePage>, ApiError> {
    match profile_page(state.actions(), Some(&me), &identity).await? {
        Gate::Ready(Some(page)) => Ok(Json(page)),
        Gate::Ready(None) => Err(user_not_found(identity)),
        Gate::NeedsOnboarding => Err(ApiError::OnboardingRequired),
        Gate::SignedOut => Err(ApiError::Unauthorized),
    }
}

/// GET /users/{identity}/threads - threads authored by a user
async fn get_user_threads(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<UserPosts>, ApiError> {
    match state.actions().fetch_user_posts(&identity).await? {
        Some(posts) => Ok(Json(posts)),
        None => Err(user_not_found(identity)),
    }
}

/// User routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me).put(put_me))
        .route("/users/{identity}", get(get_profile))
        .route("/users/{identity}/threads", get(get_user_threads))
}
