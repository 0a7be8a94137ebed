//! Repository for the `images` table and the `project_images` association.

use planner_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::image::{CreateImage, Image, ProjectImage};

const COLUMNS: &str = "id, file_path, uploaded_at";

/// Same columns qualified for joins against `project_images`.
const JOINED_COLUMNS: &str = "i.id, i.file_path, i.uploaded_at";

/// Stored images and their project associations.
///
/// Nothing here deletes an image row; detaching only drops the association.
pub struct ImageRepo;

impl ImageRepo {
    /// Register a stored image file, returning the created row.
    pub async fn create(conn: &mut PgConnection, input: &CreateImage) -> Result<Image, sqlx::Error> {
        let query = format!("INSERT INTO images (file_path) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, Image>(&query)
            .bind(&input.file_path)
            .fetch_one(&mut *conn)
            .await
    }

    /// Find an image by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Image>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM images WHERE id = $1");
        sqlx::query_as::<_, Image>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether an image row with this ID exists.
    pub async fn exists(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM images WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await
    }

    /// Images attached to a project, in upload order.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Image>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS}
             FROM images i
             JOIN project_images pi ON pi.image_id = i.id
             WHERE pi.project_id = $1
             ORDER BY i.id"
        );
        sqlx::query_as::<_, Image>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Images attached to any of `project_ids`, ordered by project and then
    /// upload order. One query regardless of how many projects are given.
    pub async fn list_for_projects(
        pool: &PgPool,
        project_ids: &[DbId],
    ) -> Result<Vec<ProjectImage>, sqlx::Error> {
        let query = format!(
            "SELECT pi.project_id, {JOINED_COLUMNS}
             FROM images i
             JOIN project_images pi ON pi.image_id = i.id
             WHERE pi.project_id = ANY($1)
             ORDER BY pi.project_id, i.id"
        );
        sqlx::query_as::<_, ProjectImage>(&query)
            .bind(project_ids)
            .fetch_all(pool)
            .await
    }

    /// IDs of the images attached to a project.
    pub async fn attached_ids(
        conn: &mut PgConnection,
        project_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT image_id FROM project_images WHERE project_id = $1 ORDER BY image_id",
        )
        .bind(project_id)
        .fetch_all(&mut *conn)
        .await
    }

    /// Attach an image to a project. Attaching twice is a no-op.
    pub async fn attach(
        conn: &mut PgConnection,
        project_id: DbId,
        image_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO project_images (project_id, image_id) VALUES ($1, $2)
             ON CONFLICT (project_id, image_id) DO NOTHING",
        )
        .bind(project_id)
        .bind(image_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Detach an image from a project. Returns `true` if an association was removed.
    pub async fn detach(
        conn: &mut PgConnection,
        project_id: DbId,
        image_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM project_images WHERE project_id = $1 AND image_id = $2")
                .bind(project_id)
                .bind(image_id)
                .execute(&mut *conn)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
