// SPDX-License-Identifier: MIT

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use formtrack::config::Config;
use formtrack::db::Database;
use formtrack::routes::create_router;
use formtrack::services::pose::PoseEngine;
use formtrack::services::{AnalysisWorker, DisabledPoseEngine};
use formtrack::AppState;
use std::sync::Arc;
use tower::ServiceExt;

/// Create a test app backed by an in-memory database and the given
/// pose engine. Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app_with_engine(
    engine: Arc<dyn PoseEngine>,
) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();

    let db = Database::new_in_memory()
        .await
        .expect("Failed to open in-memory database");
    db.run_migrations().await.expect("Failed to run migrations");

    let worker = AnalysisWorker::spawn(db.clone(), engine, config.analysis_workers);

    let state = Arc::new(AppState { config, db, worker });

    (create_router(state.clone()), state)
}

/// Create a test app with no pose backend (analyses yield no data).
#[allow(dead_code)]
pub async fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_engine(Arc::new(DisabledPoseEngine)).await
}

/// Sign up a user with defaulted profile fields.
#[allow(dead_code)]
pub async fn signup(app: &axum::Router, username: &str, email: &str, password: &str) -> StatusCode {
    let body = serde_json::json!({
        "username": username,
        "email": email,
        "password": password,
        "age": 30,
        "gender": "other",
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/signup")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    response.status()
}

/// Log in and return the session cookie pair ("name=value") from the
/// Set-Cookie header.
#[allow(dead_code)]
pub async fn login(app: &axum::Router, username: &str, password: &str) -> String {
    let body = serde_json::json!({ "username": username, "password": password });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK, "login should succeed");

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login should set a session cookie")
        .to_str()
        .unwrap();

    set_cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

/// Sign up a fresh user and return their session cookie.
#[allow(dead_code)]
pub async fn signup_and_login(app: &axum::Router, username: &str) -> String {
    let email = format!("{}@example.com", username);
    let status = signup(app, username, &email, "hunter2hunter2").await;
    assert_eq!(status, StatusCode::CREATED);
    login(app, username, "hunter2hunter2").await
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Multipart boundary used by [`multipart_body`].
#[allow(dead_code)]
pub const BOUNDARY: &str = "formtrack-test-boundary";

/// Build a multipart form body with optional video, notes, and weight
/// fields.
#[allow(dead_code)]
pub fn multipart_body(video: Option<&[u8]>, notes: &str, weight: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();

    if let Some(bytes) = video {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"video\"; filename=\"workout.mp4\"\r\nContent-Type: video/mp4\r\n\r\n",
                BOUNDARY
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"notes\"\r\n\r\n{}\r\n",
            BOUNDARY, notes
        )
        .as_bytes(),
    );

    if let Some(weight) = weight {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"weight\"\r\n\r\n{}\r\n",
                BOUNDARY, weight
            )
            .as_bytes(),
        );
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Poll an analysis job until it leaves the processing state.
#[allow(dead_code)]
pub async fn poll_analysis(
    app: &axum::Router,
    cookie: &str,
    job_id: &str,
) -> serde_json::Value {
    for _ in 0..100 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(format!("/api/analysis/{}", job_id))
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;

        if body["status"] != "processing" {
            return body;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    panic!("analysis job {} never finished", job_id);
}
