// SPDX-License-Identifier: MIT

//! Dashboard and workout dispatch tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_empty_dashboard_has_all_exercise_groups() {
    let (app, _state) = common::create_test_app().await;
    let cookie = common::signup_and_login(&app, "rachel").await;

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

    assert_eq!(response.status(), StatusCode::OK);
    let json = common::body_json(response).await;

    assert_eq!(json["username"], "rachel");
    for exercise in ["pushups", "squats", "planks", "lunges", "pullups"] {
        let logs = json["workout_logs"][exercise]
            .as_array()
            .unwrap_or_else(|| panic!("{} group missing", exercise));
        assert!(logs.is_empty());
    }
}

#[tokio::test]
async fn test_start_workout_known_exercises() {
    let (app, _state) = common::create_test_app().await;
    let cookie = common::signup_and_login(&app, "sybil").await;

    // Weight is only offered where the capture form accepts it
    let cases = [
        ("pushups", false),
        ("squats", true),
        ("planks", true),
        ("lunges", true),
        ("pullups", false),
    ];

    for (exercise, accepts_weight) in cases {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(format!("/api/start_workout/{}", exercise))
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = common::body_json(response).await;
        assert_eq!(json["exercise"], exercise);
        assert_eq!(json["accepts_weight"], accepts_weight);
        assert_eq!(
            json["capture_endpoint"],
            format!("/api/capture_video/{}", exercise)
        );
    }
}

#[tokio::test]
async fn test_start_workout_unknown_exercise() {
    let (app, _state) = common::create_test_app().await;
    let cookie = common::signup_and_login(&app, "trent").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/start_workout/burpees")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = common::body_json(response).await;
    assert_eq!(json["error"], "bad_request");
    assert_eq!(json["details"], "Invalid exercise");
}
