//! Stored image model.

use planner_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `images` table.
///
/// `file_path` is relative to the media root, e.g.
/// `project_images/0b9e..._plan.png`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Image {
    pub id: DbId,
    pub file_path: String,
    pub uploaded_at: Timestamp,
}

impl Image {
    /// Last path segment, used as the caption in exports.
    pub fn file_name(&self) -> &str {
        self.file_path.rsplit('/').next().unwrap_or(&self.file_path)
    }
}

/// An attached image together with the project it belongs to.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectImage {
    pub project_id: DbId,
    #[sqlx(flatten)]
    pub image: Image,
}

/// DTO for registering a stored image file.
#[derive(Debug, Clone)]
pub struct CreateImage {
    pub file_path: String,
}
