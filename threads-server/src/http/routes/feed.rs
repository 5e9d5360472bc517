//! Home feed endpoint

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::http::extractors::MaybeIdentity;
use crate::models::{Pagination, PaginationParams};
use crate::pages::{home_page, HomePage};
use crate::state::AppState;

/// GET /feed - top-level threads, newest first
///
/// Always 200; a failed read is reported as the page notice.
async fn feed(
    State(state): State<AppState>,
    MaybeIdentity(viewer): MaybeIdentity,
    Query(params): Query<PaginationParams>,
) -> Json<HomePage> {
    let page = Pagination::from(params);
    Json(home_page(state.actions(), viewer.as_deref(), page).await)
}

/// Feed routes
pub fn router() -> Router<AppState> {
    Router::new().route("/feed", get(feed))
}
