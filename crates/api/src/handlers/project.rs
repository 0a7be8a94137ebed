//! Handlers for the `/projects` resource.
//!
//! Create and update take a multipart form (see [`crate::forms`]) and run
//! the scalar write plus image reconciliation in one transaction. Every
//! handler addressing a single project goes through [`OwnedProject`].

use std::collections::HashMap;

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use planner_core::document::{self, DocumentImage, FsImageLoader, ProjectDocument};
use planner_core::error::CoreError;
use planner_core::reconcile::reconcile;
use planner_core::types::{DbId, Timestamp};
use planner_db::models::image::Image;
use planner_db::models::project::Project;
use planner_db::repositories::{CategoryRepo, ImageRepo, ProjectRepo};
use planner_mail::{parse_recipient, EmailAttachment, OutgoingEmail};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::forms::ProjectForm;
use crate::images::ProjectImageStore;
use crate::middleware::auth::AuthUser;
use crate::middleware::ownership::OwnedProject;
use crate::response::MessageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// An attached image as shown to clients.
#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub id: DbId,
    /// Public URL under `/media`.
    pub image: String,
    pub uploaded_at: Timestamp,
}

/// A project together with its images.
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    #[serde(flatten)]
    pub project: Project,
    pub images: Vec<ImageResponse>,
}

/// Request body for `POST /projects/{id}/email`.
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: Option<String>,
    #[serde(default)]
    pub include_pdf: bool,
}

async fn with_images(state: &AppState, project: Project) -> AppResult<ProjectResponse> {
    let images = ImageRepo::list_for_project(&state.pool, project.id)
        .await?
        .into_iter()
        .map(|image| image_response(state, image))
        .collect();
    Ok(ProjectResponse { project, images })
}

fn image_response(state: &AppState, image: Image) -> ImageResponse {
    ImageResponse {
        id: image.id,
        image: state.media.url_of(&image.file_path),
        uploaded_at: image.uploaded_at,
    }
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/projects
///
/// Only the caller's own projects, newest first.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<ProjectResponse>>> {
    let projects = ProjectRepo::list_by_owner(&state.pool, user.user_id).await?;
    let ids: Vec<DbId> = projects.iter().map(|p| p.id).collect();

    let mut images: HashMap<DbId, Vec<ImageResponse>> = HashMap::new();
    for row in ImageRepo::list_for_projects(&state.pool, &ids).await? {
        images
            .entry(row.project_id)
            .or_default()
            .push(image_response(&state, row.image));
    }

    let responses = projects
        .into_iter()
        .map(|project| {
            let images = images.remove(&project.id).unwrap_or_default();
            ProjectResponse { project, images }
        })
        .collect();
    Ok(Json(responses))
}

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ProjectResponse>)> {
    let form = ProjectForm::from_multipart(multipart).await?;
    let input = form.to_create(user.user_id)?;

    let mut tx = state.pool.begin().await?;
    let project = ProjectRepo::create(&mut *tx, &input).await?;
    let outcome = {
        let mut store = ProjectImageStore::new(&mut *tx, &state.media);
        reconcile(&mut store, project.id, &form.existing_images, form.uploads).await?
    };
    tx.commit().await?;

    tracing::info!(
        project_id = project.id,
        user_id = user.user_id,
        images = outcome.final_image_ids().len(),
        "Project created"
    );

    Ok((StatusCode::CREATED, Json(with_images(&state, project).await?)))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    OwnedProject { project, .. }: OwnedProject,
) -> AppResult<Json<ProjectResponse>> {
    Ok(Json(with_images(&state, project).await?))
}

/// PUT/PATCH /api/v1/projects/{id}
///
/// Fields not present in the form keep their value. The image set is
/// always reconciled: omitting `existing_images` detaches every image.
pub async fn update(
    State(state): State<AppState>,
    OwnedProject { project, user }: OwnedProject,
    multipart: Multipart,
) -> AppResult<Json<ProjectResponse>> {
    let form = ProjectForm::from_multipart(multipart).await?;
    let input = form.to_update()?;
    let id = project.id;

    let mut tx = state.pool.begin().await?;
    let project = ProjectRepo::update(&mut *tx, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;
    let outcome = {
        let mut store = ProjectImageStore::new(&mut *tx, &state.media);
        reconcile(&mut store, id, &form.existing_images, form.uploads).await?
    };
    tx.commit().await?;

    tracing::info!(
        project_id = id,
        user_id = user.user_id,
        detached = outcome.detached.len(),
        retained = outcome.retained.len(),
        skipped = outcome.skipped.len(),
        created = outcome.created.len(),
        "Project updated"
    );

    Ok(Json(with_images(&state, project).await?))
}

/// DELETE /api/v1/projects/{id}
///
/// Image rows and files are kept; only the associations go.
pub async fn delete(
    State(state): State<AppState>,
    OwnedProject { project, user }: OwnedProject,
) -> AppResult<StatusCode> {
    if ProjectRepo::delete(&state.pool, project.id).await? {
        tracing::info!(project_id = project.id, user_id = user.user_id, "Project deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project.id,
        }))
    }
}

// ---------------------------------------------------------------------------
// Export and email
// ---------------------------------------------------------------------------

/// Render a project to PDF bytes on the blocking pool.
async fn render_pdf(state: &AppState, project: &Project) -> AppResult<Vec<u8>> {
    let category = CategoryRepo::find_by_id(&state.pool, project.category_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id: project.category_id,
        }))?;

    let images = ImageRepo::list_for_project(&state.pool, project.id)
        .await?
        .into_iter()
        .map(|image| DocumentImage {
            file_name: image.file_name().to_string(),
            path: state.media.path_of(&image.file_path),
        })
        .collect();

    let doc = ProjectDocument {
        title: project.title.clone(),
        description: project.description.clone(),
        priority: project.priority,
        status: project.status,
        category: category.name,
        start_date: project.start_date,
        end_date: project.end_date,
        images,
    };

    tokio::task::spawn_blocking(move || document::render(&doc, &FsImageLoader))
        .await
        .map_err(|e| AppError::InternalError(format!("PDF rendering task failed: {e}")))
}

/// GET /api/v1/projects/{id}/export
pub async fn export(
    State(state): State<AppState>,
    OwnedProject { project, .. }: OwnedProject,
) -> AppResult<Response> {
    let bytes = render_pdf(&state, &project).await?;
    tracing::info!(project_id = project.id, bytes = bytes.len(), "Exported project PDF");

    let disposition = format!(
        "attachment; filename={}",
        document::export_file_name(project.id)
    );
    Ok((
        [
            (header::CONTENT_TYPE, document::CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// POST /api/v1/projects/{id}/email
pub async fn email(
    State(state): State<AppState>,
    OwnedProject { project, .. }: OwnedProject,
    Json(input): Json<EmailRequest>,
) -> AppResult<Json<MessageResponse>> {
    let recipient = input
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest("Email address is required.".into()))?;
    parse_recipient(recipient)
        .map_err(|_| AppError::BadRequest(format!("Invalid email address: {recipient}")))?;

    let mailer = state
        .mailer
        .clone()
        .ok_or_else(|| AppError::ServiceUnavailable("Email delivery is not configured".into()))?;

    let attachment = if input.include_pdf {
        Some(EmailAttachment {
            file_name: attachment_file_name(&project.title),
            content_type: document::CONTENT_TYPE.to_string(),
            bytes: render_pdf(&state, &project).await?,
        })
    } else {
        None
    };

    mailer
        .send(OutgoingEmail {
            to: recipient.to_string(),
            subject: format!("Project Details: {}", project.title),
            body: format!("Description:\n\n{}", project.description),
            attachment,
        })
        .await
        .map_err(|e| AppError::ServiceUnavailable(format!("Failed to send email: {e}")))?;

    tracing::info!(project_id = project.id, include_pdf = input.include_pdf, "Project emailed");
    Ok(Json(MessageResponse::new("Email sent successfully!")))
}

/// `<title>.pdf` with characters that break a MIME file name replaced.
fn attachment_file_name(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '"' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "project.pdf".to_string()
    } else {
        format!("{cleaned}.pdf")
    }
}
