pub mod auth;
pub mod category;
pub mod project;
pub mod summary;
