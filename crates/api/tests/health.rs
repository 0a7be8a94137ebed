//! Health check, media serving and cross-cutting middleware.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_bytes, body_json, get, png_bytes, send_multipart, MultipartBody};
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn health_reports_database(pool: PgPool) {
    let test = common::build_test_app(pool);
    let response = get(test.app(), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_path_is_not_found(pool: PgPool) {
    let test = common::build_test_app(pool);
    let response = get(test.app(), "/api/v1/nothing-here").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn every_response_gets_a_request_id(pool: PgPool) {
    let test = common::build_test_app(pool);
    let response = get(test.app(), "/api/v1/project-categories").await;

    let request_id = response.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(request_id).is_ok());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn uploaded_images_are_served_from_media(pool: PgPool) {
    let owner = common::create_user(&pool, "alice").await;
    let category = common::create_category(&pool, "Web").await;
    let test = common::build_test_app(pool);
    let png = png_bytes();

    let response = send_multipart(
        test.app(),
        Method::POST,
        "/api/v1/projects",
        MultipartBody::project("Gallery", category).file("uploaded_images", "cover.png", &png),
        &test.token_for(owner),
    )
    .await;
    let project = body_json(response).await;
    let url = project["images"][0]["image"].as_str().unwrap().to_string();

    let response = get(test.app(), &url).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, png);
}
