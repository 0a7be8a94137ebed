use std::sync::Arc;

use planner_inference::InferenceClient;
use planner_mail::MailSender;

use crate::config::ServerConfig;
use crate::media::MediaStorage;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: every field is a pool, an `Arc`, or a small owned value.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: planner_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Where uploaded images are written and read back from.
    pub media: MediaStorage,
    /// Client for the description-summary model.
    pub inference: InferenceClient,
    /// Outbound mail; `None` when SMTP is not configured.
    pub mailer: Option<Arc<dyn MailSender>>,
}
