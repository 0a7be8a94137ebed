//! AI-generated description summaries.

use axum::extract::State;
use axum::Json;
use planner_core::summary::build_prompt;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub project_description: Option<String>,
    pub project_title: Option<String>,
    pub project_category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub description: String,
}

/// POST /api/v1/generate-description-summary
///
/// One call to the inference API, no retry. Any failure there is a 503.
pub async fn generate(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<SummaryRequest>,
) -> AppResult<Json<SummaryResponse>> {
    let prompt = build_prompt(
        input.project_description.as_deref(),
        input.project_title.as_deref(),
        input.project_category.as_deref(),
    )?;

    tracing::debug!(user_id = user.user_id, prompt_chars = prompt.len(), "Requesting summary");

    let description = state.inference.summarize(&prompt).await.map_err(|e| {
        AppError::ServiceUnavailable(format!("Error contacting the AI service: {e}"))
    })?;

    Ok(Json(SummaryResponse { description }))
}
