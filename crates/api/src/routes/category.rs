//! Route definitions for the `/project-categories` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::category;
use crate::state::AppState;

/// Routes mounted at `/project-categories`.
///
/// ```text
/// GET    /   -> list (public)
/// POST   /   -> create (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(category::list).post(category::create))
}
