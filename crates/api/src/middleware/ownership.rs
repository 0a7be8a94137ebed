//! Owner check for project-scoped routes.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use planner_core::error::CoreError;
use planner_core::types::DbId;
use planner_db::models::project::Project;
use planner_db::repositories::ProjectRepo;

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// A project loaded from the `{id}` path segment that the caller owns.
///
/// Rejects with 401 without a valid token, 404 if the project does not
/// exist and 403 if someone else owns it. Handlers taking this extractor
/// never see another user's project.
#[derive(Debug, Clone)]
pub struct OwnedProject {
    pub user: AuthUser,
    pub project: Project,
}

impl FromRequestParts<AppState> for OwnedProject {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        let Path(id) = Path::<DbId>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let project = ProjectRepo::find_by_id(&state.pool, id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Project",
                id,
            }))?;

        if project.owner_id != user.user_id {
            tracing::debug!(project_id = id, user_id = user.user_id, "Rejected non-owner");
            return Err(AppError::Core(CoreError::Forbidden(
                "You do not have permission to access this project".into(),
            )));
        }

        Ok(OwnedProject { user, project })
    }
}
