//! Database-backed [`ImageStore`] used when reconciling a project's images.

use async_trait::async_trait;
use planner_core::reconcile::{ImageStore, ImageUpload};
use planner_core::types::DbId;
use planner_db::models::image::CreateImage;
use planner_db::repositories::ImageRepo;
use sqlx::PgConnection;

use crate::error::AppError;
use crate::media::MediaStorage;

/// Reconciles images through one connection, normally an open transaction.
///
/// Uploaded files are written to disk before their row is inserted; a
/// rollback leaves the file behind.
pub struct ProjectImageStore<'a> {
    conn: &'a mut PgConnection,
    media: &'a MediaStorage,
}

impl<'a> ProjectImageStore<'a> {
    pub fn new(conn: &'a mut PgConnection, media: &'a MediaStorage) -> Self {
        Self { conn, media }
    }
}

#[async_trait]
impl ImageStore for ProjectImageStore<'_> {
    type Error = AppError;

    async fn attached_image_ids(&mut self, project_id: DbId) -> Result<Vec<DbId>, AppError> {
        Ok(ImageRepo::attached_ids(&mut *self.conn, project_id).await?)
    }

    async fn detach(&mut self, project_id: DbId, image_id: DbId) -> Result<(), AppError> {
        ImageRepo::detach(&mut *self.conn, project_id, image_id).await?;
        Ok(())
    }

    async fn image_exists(&mut self, image_id: DbId) -> Result<bool, AppError> {
        Ok(ImageRepo::exists(&mut *self.conn, image_id).await?)
    }

    async fn attach(&mut self, project_id: DbId, image_id: DbId) -> Result<(), AppError> {
        ImageRepo::attach(&mut *self.conn, project_id, image_id).await?;
        Ok(())
    }

    async fn create_image(&mut self, upload: ImageUpload) -> Result<DbId, AppError> {
        let file_path = self
            .media
            .save_image(&upload)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to store image: {e}")))?;

        let image = ImageRepo::create(&mut *self.conn, &CreateImage { file_path }).await?;
        Ok(image.id)
    }
}
