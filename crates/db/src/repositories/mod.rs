//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Read-only lookups accept `&PgPool`; methods that take part in a project
//! write accept `&mut PgConnection` so they can run inside a transaction.

pub mod category_repo;
pub mod image_repo;
pub mod project_repo;
pub mod user_repo;

pub use category_repo::CategoryRepo;
pub use image_repo::ImageRepo;
pub use project_repo::ProjectRepo;
pub use user_repo::UserRepo;
