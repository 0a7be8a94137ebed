//! Route definitions for the `/projects` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::project;
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /              -> list
/// POST   /              -> create (multipart)
/// GET    /{id}          -> get_by_id
/// PUT    /{id}          -> update (multipart)
/// PATCH  /{id}          -> update (multipart)
/// DELETE /{id}          -> delete
/// GET    /{id}/export   -> export (PDF download)
/// POST   /{id}/email    -> email
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route(
            "/{id}",
            get(project::get_by_id)
                .put(project::update)
                .patch(project::update)
                .delete(project::delete),
        )
        .route("/{id}/export", get(project::export))
        .route("/{id}/email", post(project::email))
}
