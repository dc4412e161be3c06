// SPDX-License-Identifier: MIT

//! FormTrack: workout tracking with video-based form analysis
//!
//! This crate provides the backend API for recording workout sessions
//! across five exercise types and deriving reps, sets, duration, and
//! form attributes from uploaded videos via pose-landmark analysis.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Database;
use services::AnalysisWorker;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub worker: AnalysisWorker,
}
