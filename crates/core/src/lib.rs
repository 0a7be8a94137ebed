//! Domain logic for the project planner.
//!
//! Everything here is free of database and HTTP concerns so it can be unit
//! tested in isolation:
//!
//! - [`project`] -- priority / status choices and field limits.
//! - [`reconcile`] -- image-set reconciliation behind the [`reconcile::ImageStore`] seam.
//! - [`document`] -- paginated PDF export of a project.
//! - [`summary`] -- prompt building and response parsing for AI summaries.

pub mod document;
pub mod error;
pub mod project;
pub mod reconcile;
pub mod summary;
pub mod types;
