//! Handlers for the `/project-categories` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use planner_core::project::MAX_CATEGORY_NAME_LEN;
use planner_db::models::category::{Category, CreateCategory};
use planner_db::repositories::CategoryRepo;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Body of `POST /project-categories`. The name is trimmed before it is
/// checked.
#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(
        min = 1,
        max = MAX_CATEGORY_NAME_LEN,
        message = "Ensure this field has between 1 and 255 characters."
    ))]
    pub name: String,
}

/// GET /api/v1/project-categories
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(CategoryRepo::list(&state.pool).await?))
}

/// POST /api/v1/project-categories
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut input): Json<CategoryRequest>,
) -> AppResult<(StatusCode, Json<Category>)> {
    input.name = input.name.trim().to_string();
    input.validate()?;

    let category = CategoryRepo::create(&state.pool, &CreateCategory { name: input.name }).await?;

    tracing::info!(category_id = category.id, user_id = user.user_id, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}
