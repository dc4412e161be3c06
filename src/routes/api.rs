// SPDX-License-Identifier: MIT

//! API routes for authenticated users.
//!
//! The auth middleware is applied in routes/mod.rs for these routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Exercise, LungesLog, PlanksLog, PullupsLog, PushupsLog, SquatsLog};
use crate::services::worker::JobStatus;
use crate::services::ScratchFile;
use crate::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/start_workout/{exercise}", get(start_workout))
        .route("/api/capture_video/{exercise}", post(capture_video))
        .route(
            "/api/analysis/{job_id}",
            get(get_analysis).delete(cancel_analysis),
        )
}

// ─── Dashboard ───────────────────────────────────────────────

/// Log records grouped by exercise type.
#[derive(Serialize)]
pub struct WorkoutLogs {
    pub pushups: Vec<PushupsLog>,
    pub squats: Vec<SquatsLog>,
    pub planks: Vec<PlanksLog>,
    pub lunges: Vec<LungesLog>,
    pub pullups: Vec<PullupsLog>,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub username: String,
    pub workout_logs: WorkoutLogs,
}

/// All of the user's log records, grouped by exercise type.
async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DashboardResponse>> {
    let workout_logs = WorkoutLogs {
        pushups: state.db.pushups_logs_for_user(user.user_id).await?,
        squats: state.db.squats_logs_for_user(user.user_id).await?,
        planks: state.db.planks_logs_for_user(user.user_id).await?,
        lunges: state.db.lunges_logs_for_user(user.user_id).await?,
        pullups: state.db.pullups_logs_for_user(user.user_id).await?,
    };

    Ok(Json(DashboardResponse {
        username: user.username,
        workout_logs,
    }))
}

// ─── Workout dispatch ────────────────────────────────────────

#[derive(Serialize)]
pub struct StartWorkoutResponse {
    pub exercise: &'static str,
    pub capture_endpoint: String,
    /// Whether the capture form accepts a weight field
    pub accepts_weight: bool,
}

/// Dispatch metadata for one of the five known exercises.
async fn start_workout(Path(exercise): Path<String>) -> Result<Json<StartWorkoutResponse>> {
    let exercise: Exercise = exercise
        .parse()
        .map_err(|e: crate::models::UnknownExercise| AppError::BadRequest(e.to_string()))?;

    Ok(Json(StartWorkoutResponse {
        exercise: exercise.slug(),
        capture_endpoint: format!("/api/capture_video/{}", exercise.slug()),
        accepts_weight: exercise.accepts_weight(),
    }))
}

// ─── Video capture ───────────────────────────────────────────

#[derive(Serialize)]
pub struct CaptureResponse {
    pub status: &'static str,
    pub job_id: Uuid,
}

/// Accept one workout video and queue it for analysis.
///
/// The upload streams to a unique scratch path; the handler returns
/// 202 with a job id as soon as the job is queued, never holding the
/// connection for the analysis itself.
async fn capture_video(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(exercise): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CaptureResponse>)> {
    let exercise: Exercise = exercise
        .parse()
        .map_err(|e: crate::models::UnknownExercise| AppError::BadRequest(e.to_string()))?;

    let mut video: Option<ScratchFile> = None;
    let mut notes = String::new();
    let mut weight: Option<i64> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("video") => {
                let scratch = ScratchFile::allocate(std::path::Path::new(&state.config.upload_dir))
                    .map_err(|e| AppError::Internal(e.into()))?;
                let mut file = tokio::fs::File::create(scratch.path())
                    .await
                    .map_err(|e| AppError::Internal(e.into()))?;

                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Upload interrupted: {}", e)))?
                {
                    file.write_all(&chunk)
                        .await
                        .map_err(|e| AppError::Internal(e.into()))?;
                }
                file.flush()
                    .await
                    .map_err(|e| AppError::Internal(e.into()))?;

                video = Some(scratch);
            }
            Some("notes") => {
                notes = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Malformed notes field: {}", e)))?;
            }
            Some("weight") if exercise.accepts_weight() => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Malformed weight field: {}", e)))?;
                weight = text.trim().parse().ok();
            }
            _ => {}
        }
    }

    let Some(video) = video else {
        return Err(AppError::BadRequest("No video file provided".to_string()));
    };

    let job_id = state
        .worker
        .submit(user.user_id, exercise, video, notes, weight)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CaptureResponse {
            status: "queued",
            job_id,
        }),
    ))
}

// ─── Analysis polling & cancellation ─────────────────────────

/// Poll a queued analysis job.
async fn get_analysis(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let job = state
        .worker
        .job(job_id)
        .filter(|job| job.user_id == user.user_id)
        .ok_or_else(|| AppError::NotFound(format!("Analysis job {} not found", job_id)))?;

    let body = match &job.status {
        JobStatus::Queued | JobStatus::Running => serde_json::json!({
            "status": "processing",
            "exercise": job.exercise.slug(),
        }),
        JobStatus::Completed {
            report,
            log_id,
            no_data,
        } => serde_json::json!({
            "status": "success",
            "message": "Video analyzed and data saved successfully!",
            "exercise": job.exercise.slug(),
            "log_id": log_id,
            "no_data": no_data,
            "report": report,
        }),
        JobStatus::Failed { error } => serde_json::json!({
            "status": "failed",
            "exercise": job.exercise.slug(),
            "error": error,
        }),
        JobStatus::Cancelled => serde_json::json!({
            "status": "cancelled",
            "exercise": job.exercise.slug(),
        }),
    };

    Ok(Json(body))
}

/// Cancel a queued or running analysis job.
async fn cancel_analysis(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let owned = state
        .worker
        .job(job_id)
        .is_some_and(|job| job.user_id == user.user_id);

    if !owned || !state.worker.cancel(job_id) {
        return Err(AppError::NotFound(format!(
            "Analysis job {} not found",
            job_id
        )));
    }

    tracing::info!(job_id = %job_id, user_id = user.user_id, "Cancellation requested");

    Ok(Json(serde_json::json!({ "status": "cancelling" })))
}
