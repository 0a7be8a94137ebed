pub mod auth;
pub mod category;
pub mod health;
pub mod project;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/signup                          create account (public)
/// /auth/login                           issue access token (public)
///
/// /projects                             list, create (auth)
/// /projects/{id}                        get, update, delete (owner)
/// /projects/{id}/export                 PDF download (owner)
/// /projects/{id}/email                  email details (owner)
///
/// /project-categories                   list (public), create (auth)
///
/// /generate-description-summary         AI summary (auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/projects", project::router())
        .nest("/project-categories", category::router())
        .route(
            "/generate-description-summary",
            post(handlers::summary::generate),
        )
}
