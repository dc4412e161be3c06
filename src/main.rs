// SPDX-License-Identifier: MIT

//! FormTrack API Server
//!
//! Records workout sessions for five exercise types and analyzes
//! uploaded videos frame-by-frame to estimate reps, duration, and
//! derived metrics.

use formtrack::{
    config::Config,
    db::Database,
    services::{AnalysisWorker, DisabledPoseEngine},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting FormTrack API");

    // Initialize SQLite database
    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    db.run_migrations()
        .await
        .expect("Failed to run database migrations");
    tracing::info!(url = %config.database_url, "Database ready");

    // Ensure the upload scratch directory exists
    std::fs::create_dir_all(&config.upload_dir).expect("Failed to create upload directory");

    // Pose estimation backend. No on-device model is bundled; captures
    // are accepted and recorded, but produce no-data reports until an
    // engine is wired in.
    let pose: Arc<dyn formtrack::services::pose::PoseEngine> = Arc::new(DisabledPoseEngine);
    tracing::warn!("No pose engine configured; analyses will produce no detections");

    // Spawn the background analysis worker pool
    let worker = AnalysisWorker::spawn(db.clone(), pose, config.analysis_workers);
    tracing::info!(workers = config.analysis_workers, "Analysis workers started");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        worker,
    });

    // Build router
    let app = formtrack::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("formtrack=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
