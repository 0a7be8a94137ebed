//! Shared harness for the API integration tests.
//!
//! Builds the production router over a `#[sqlx::test]` pool with a
//! temporary media root, a recording mailer and an inference client that
//! points wherever the test wants.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use planner_api::auth::jwt::{generate_access_token, JwtConfig};
use planner_api::auth::password::hash_password;
use planner_api::config::ServerConfig;
use planner_api::media::MediaStorage;
use planner_api::router::build_app_router;
use planner_api::state::AppState;
use planner_core::types::DbId;
use planner_db::models::category::CreateCategory;
use planner_db::models::user::CreateUser;
use planner_db::repositories::{CategoryRepo, UserRepo};
use planner_inference::{InferenceClient, InferenceConfig};
use planner_mail::{EmailError, MailSender, OutgoingEmail};
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "planner-password-1";

/// Nothing listens on the discard port locally, so requests fail fast.
pub const UNREACHABLE_INFERENCE_URL: &str = "http://127.0.0.1:9";

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Mail transport double that keeps every message it is asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl MailSender for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

pub struct TestOptions {
    /// Install a [`RecordingMailer`]; without one, email is "not configured".
    pub mailer: bool,
    pub inference_url: String,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            mailer: true,
            inference_url: UNREACHABLE_INFERENCE_URL.to_string(),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub config: ServerConfig,
    pub mailer: Arc<RecordingMailer>,
    /// Held so the media root lives as long as the app.
    pub media_dir: TempDir,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    pub fn media_root(&self) -> &Path {
        self.media_dir.path()
    }

    pub fn sent_emails(&self) -> Vec<OutgoingEmail> {
        self.mailer.sent.lock().unwrap().clone()
    }

    pub fn token_for(&self, user_id: DbId) -> String {
        generate_access_token(user_id, &self.config.jwt).unwrap()
    }
}

pub fn test_config(media_root: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 25 * 1024 * 1024,
        media_root: media_root.to_path_buf(),
        jwt: JwtConfig {
            secret: "planner-integration-test-secret".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with(pool, TestOptions::default())
}

pub fn build_test_app_with(pool: PgPool, options: TestOptions) -> TestApp {
    let media_dir = tempfile::tempdir().unwrap();
    let config = test_config(media_dir.path());
    let recorder = Arc::new(RecordingMailer::default());

    let mailer: Option<Arc<dyn MailSender>> = if options.mailer {
        Some(recorder.clone() as Arc<dyn MailSender>)
    } else {
        None
    };

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        media: MediaStorage::new(media_dir.path()),
        inference: InferenceClient::new(InferenceConfig {
            api_url: options.inference_url,
            model: "test/model".to_string(),
            access_token: "test-token".to_string(),
            timeout: Duration::from_secs(2),
        }),
        mailer,
    };

    TestApp {
        router: build_app_router(state, &config),
        config,
        mailer: recorder,
        media_dir,
    }
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

/// Insert a user with [`TEST_PASSWORD`] and return its id.
pub async fn create_user(pool: &PgPool, username: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn create_category(pool: &PgPool, name: &str) -> DbId {
    CategoryRepo::create(pool, &CreateCategory { name: name.to_string() })
        .await
        .unwrap()
        .id
}

/// A small valid PNG.
pub fn png_bytes() -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    image::RgbImage::from_pixel(4, 4, image::Rgb([200, 40, 40]))
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

// ---------------------------------------------------------------------------
// Multipart bodies
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "planner-test-boundary";

/// Builder for `multipart/form-data` request bodies.
#[derive(Default)]
pub struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(data);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    /// The standard fields of a valid project.
    pub fn project(title: &str, category_id: DbId) -> Self {
        Self::new()
            .text("title", title)
            .text("description", "Refresh the public website")
            .text("start_date", "2024-03-01")
            .text("end_date", "2024-06-30")
            .text("category", &category_id.to_string())
    }

    fn finish(mut self) -> Vec<u8> {
        self.bytes
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.bytes
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::delete(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn send_multipart(
    app: Router,
    method: Method,
    uri: &str,
    body: MultipartBody,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.finish()))
        .unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Image ids of a project response, in response order.
pub fn image_ids(project: &serde_json::Value) -> Vec<DbId> {
    project["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_i64().unwrap())
        .collect()
}
