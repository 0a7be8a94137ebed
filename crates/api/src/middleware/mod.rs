//! Request extractors that gate handlers.
//!
//! - [`auth::AuthUser`] -- the caller identified by a Bearer token.
//! - [`ownership::OwnedProject`] -- a project the caller owns.

pub mod auth;
pub mod ownership;
