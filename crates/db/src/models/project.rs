//! Project entity model and DTOs.

use planner_core::project::{Priority, Status};
use planner_core::types::{Date, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub start_date: Date,
    pub end_date: Date,
    #[serde(rename = "category")]
    pub category_id: DbId,
    #[sqlx(try_from = "String")]
    pub priority: Priority,
    #[sqlx(try_from = "String")]
    pub status: Status,
    pub owner_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new project.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub title: String,
    pub description: String,
    pub start_date: Date,
    pub end_date: Date,
    pub category_id: DbId,
    /// Defaults to `Trivial` if omitted.
    pub priority: Option<Priority>,
    /// Defaults to `Waiting` if omitted.
    pub status: Option<Status>,
    pub owner_id: DbId,
}

/// DTO for updating an existing project. All fields are optional; the owner
/// never changes.
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub category_id: Option<DbId>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
}
