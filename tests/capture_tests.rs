// SPDX-License-Identifier: MIT

//! Video capture and background analysis tests.
//!
//! These tests drive the full path: multipart upload, queued job,
//! worker analysis against a scripted landmark stream, persistence,
//! and polling.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use formtrack::services::pose::{Detection, LandmarkKind, PoseFrame};
use formtrack::services::ScriptedPoseEngine;
use std::sync::Arc;
use tower::ServiceExt;

mod common;

/// A frame with both elbows above (or below) both shoulders.
fn pushup_frame(elbows_above: bool) -> PoseFrame {
    let (elbow_y, shoulder_y) = if elbows_above { (0.3, 0.5) } else { (0.7, 0.5) };
    PoseFrame::new()
        .with(LandmarkKind::LeftShoulder, 0.4, shoulder_y, 0.9)
        .with(LandmarkKind::RightShoulder, 0.6, shoulder_y, 0.9)
        .with(LandmarkKind::LeftElbow, 0.35, elbow_y, 0.9)
        .with(LandmarkKind::RightElbow, 0.65, elbow_y, 0.9)
}

/// Two full push-up cycles: down, up, down, up.
fn two_pushups_script() -> Vec<Detection> {
    vec![
        Detection::Pose(pushup_frame(false)),
        Detection::Pose(pushup_frame(true)),
        Detection::Pose(pushup_frame(false)),
        Detection::Pose(pushup_frame(true)),
    ]
}

async fn capture(
    app: &axum::Router,
    cookie: &str,
    exercise: &str,
    body: Vec<u8>,
) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/capture_video/{}", exercise))
                .header(header::COOKIE, cookie)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", common::BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_capture_queues_analyzes_and_persists() {
    let engine = Arc::new(ScriptedPoseEngine::new(two_pushups_script()));
    let (app, _state) = common::create_test_app_with_engine(engine).await;
    let cookie = common::signup_and_login(&app, "grace").await;

    let body = common::multipart_body(Some(b"fake video bytes"), "felt strong", None);
    let response = capture(&app, &cookie, "pushups", body).await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = common::body_json(response).await;
    assert_eq!(json["status"], "queued");
    let job_id = json["job_id"].as_str().expect("job id").to_string();

    let result = common::poll_analysis(&app, &cookie, &job_id).await;
    assert_eq!(result["status"], "success");
    assert_eq!(
        result["message"],
        "Video analyzed and data saved successfully!"
    );
    assert_eq!(result["no_data"], false);
    assert_eq!(result["report"]["reps"], 2);
    assert_eq!(result["report"]["form_notes"], "felt strong; ");

    // The record is visible on the dashboard after commit
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/dashboard")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let dashboard = common::body_json(response).await;
    let pushups = dashboard["workout_logs"]["pushups"].as_array().unwrap();
    assert_eq!(pushups.len(), 1);
    assert_eq!(pushups[0]["reps"], 2);
}

#[tokio::test]
async fn test_capture_without_pose_backend_flags_no_data() {
    let (app, _state) = common::create_test_app().await;
    let cookie = common::signup_and_login(&app, "heidi").await;

    let body = common::multipart_body(Some(b"fake video bytes"), "", None);
    let response = capture(&app, &cookie, "squats", body).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = common::body_json(response).await;
    let job_id = json["job_id"].as_str().unwrap().to_string();

    let result = common::poll_analysis(&app, &cookie, &job_id).await;

    // A record still exists for dashboard compatibility, but the
    // outcome is distinguishable from a real analysis.
    assert_eq!(result["status"], "success");
    assert_eq!(result["no_data"], true);
    assert_eq!(result["report"]["reps"], 0);
}

#[tokio::test]
async fn test_concurrent_captures_are_isolated_per_user() {
    let engine = Arc::new(ScriptedPoseEngine::new(two_pushups_script()));
    let (app, _state) = common::create_test_app_with_engine(engine).await;

    let cookie_a = common::signup_and_login(&app, "ivan").await;
    let cookie_b = common::signup_and_login(&app, "judy").await;

    // Same exercise, overlapping submissions
    let response_a = capture(
        &app,
        &cookie_a,
        "pushups",
        common::multipart_body(Some(b"video a"), "a", None),
    )
    .await;
    let response_b = capture(
        &app,
        &cookie_b,
        "pushups",
        common::multipart_body(Some(b"video b"), "b", None),
    )
    .await;

    assert_eq!(response_a.status(), StatusCode::ACCEPTED);
    assert_eq!(response_b.status(), StatusCode::ACCEPTED);

    let job_a = common::body_json(response_a).await["job_id"]
        .as_str()
        .unwrap()
        .to_string();
    let job_b = common::body_json(response_b).await["job_id"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(job_a, job_b);

    let result_a = common::poll_analysis(&app, &cookie_a, &job_a).await;
    let result_b = common::poll_analysis(&app, &cookie_b, &job_b).await;
    assert_eq!(result_a["status"], "success");
    assert_eq!(result_b["status"], "success");

    // Each user sees exactly their own record
    for cookie in [&cookie_a, &cookie_b] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/dashboard")
                    .header(header::COOKIE, cookie.as_str())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let dashboard = common::body_json(response).await;
        let pushups = dashboard["workout_logs"]["pushups"].as_array().unwrap();
        assert_eq!(pushups.len(), 1);
    }
}

#[tokio::test]
async fn test_capture_weight_field_recorded_for_squats() {
    let (app, _state) = common::create_test_app().await;
    let cookie = common::signup_and_login(&app, "karl").await;

    let body = common::multipart_body(Some(b"fake video bytes"), "", Some("60"));
    let response = capture(&app, &cookie, "squats", body).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let job_id = common::body_json(response).await["job_id"]
        .as_str()
        .unwrap()
        .to_string();

    let result = common::poll_analysis(&app, &cookie, &job_id).await;
    assert_eq!(result["report"]["weight"], 60);
}

#[tokio::test]
async fn test_capture_missing_video_field() {
    let (app, _state) = common::create_test_app().await;
    let cookie = common::signup_and_login(&app, "mallory").await;

    let body = common::multipart_body(None, "no file attached", None);
    let response = capture(&app, &cookie, "pushups", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = common::body_json(response).await;
    assert_eq!(json["details"], "No video file provided");
}

#[tokio::test]
async fn test_capture_unknown_exercise() {
    let (app, _state) = common::create_test_app().await;
    let cookie = common::signup_and_login(&app, "nina").await;

    let body = common::multipart_body(Some(b"fake video bytes"), "", None);
    let response = capture(&app, &cookie, "situps", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = common::body_json(response).await;
    assert_eq!(json["details"], "Invalid exercise");
}

#[tokio::test]
async fn test_analysis_poll_is_owner_only() {
    let (app, _state) = common::create_test_app().await;
    let cookie_owner = common::signup_and_login(&app, "oscar").await;
    let cookie_other = common::signup_and_login(&app, "peggy").await;

    let body = common::multipart_body(Some(b"fake video bytes"), "", None);
    let response = capture(&app, &cookie_owner, "pushups", body).await;
    let job_id = common::body_json(response).await["job_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/analysis/{}", job_id))
                .header(header::COOKIE, &cookie_other)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_unknown_job() {
    let (app, _state) = common::create_test_app().await;
    let cookie = common::signup_and_login(&app, "quinn").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/analysis/{}", uuid::Uuid::new_v4()))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
