//! User search endpoint

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::http::error::ApiError;
use crate::http::extractors::Identity;
use crate::models::{Pagination, SortDirection, DEFAULT_PER_PAGE};
use crate::pages::{search_page, Gate, SearchPage};
use crate::state::AppState;

/// Search query parameters
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort: Option<String>,
}

/// GET /search?q=&page=&per_page=&sort= - other users, for onboarded callers
async fn search(
    State(state): State<AppState>,
    Identity(me): Identity,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchPage>, ApiError> {
    let sort = match params.sort.as_deref() {
        Some(raw) => raw.parse::<SortDirection>()?,
        None => SortDirection::default(),
    };
    let page = Pagination::new(
        params.page.unwrap_or(1),
        params.per_page.unwrap_or(DEFAULT_PER_PAGE),
    );

    match search_page(state.actions(), Some(&me), &params.q, page, sort).await? {
        Gate::Ready(page) => Ok(Json(page)),
        Gate::NeedsOnboarding => Err(ApiError::OnboardingRequired),
        Gate::SignedOut => Err(ApiError::Unauthorized),
    }
}

/// Search routes
pub fn router() -> Router<AppState> {
    Router::new().route("/search", get(search))
}
