// SPDX-License-Identifier: MIT

//! Workout log rows, one table per exercise type.
//!
//! Each row is written exactly once when a video analysis completes and
//! is immutable afterward. Rep-based exercises carry reps and sets;
//! planks carry only a duration. The `New*` structs hold everything but
//! the row id for inserts.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PushupsLog {
    pub id: i64,
    pub user_id: i64,
    pub date: DateTime<Utc>,
    pub reps: i64,
    pub sets: i64,
    /// Duration in seconds
    pub duration: i64,
    pub difficulty: String,
    /// Rest period between sets in seconds
    pub rest_period: Option<i64>,
    pub calories_burned: Option<f64>,
    pub form_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SquatsLog {
    pub id: i64,
    pub user_id: i64,
    pub date: DateTime<Utc>,
    pub reps: i64,
    pub sets: i64,
    pub duration: i64,
    /// Weight used, if any, in kg
    pub weight: Option<i64>,
    pub rest_period: Option<i64>,
    pub calories_burned: Option<f64>,
    /// Squat depth classification ("Above parallel", "Below parallel", "Parallel")
    pub depth: Option<String>,
    pub form_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PlanksLog {
    pub id: i64,
    pub user_id: i64,
    pub date: DateTime<Utc>,
    pub duration: i64,
    /// "Forearm plank" or "Side plank"
    pub stage: Option<String>,
    pub rest_period: Option<i64>,
    pub calories_burned: Option<f64>,
    pub form_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LungesLog {
    pub id: i64,
    pub user_id: i64,
    pub date: DateTime<Utc>,
    pub reps: i64,
    pub sets: i64,
    pub duration: i64,
    pub weight: Option<i64>,
    pub rest_period: Option<i64>,
    pub calories_burned: Option<f64>,
    /// "Forward Lunge" or "Reverse Lunge"
    pub stance: Option<String>,
    pub form_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PullupsLog {
    pub id: i64,
    pub user_id: i64,
    pub date: DateTime<Utc>,
    pub reps: i64,
    pub sets: i64,
    pub duration: i64,
    pub difficulty: String,
    pub rest_period: Option<i64>,
    pub calories_burned: Option<f64>,
    /// Grip type ("Overhand", "Underhand", "Neutral")
    pub grip_type: Option<String>,
    pub form_notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPushupsLog {
    pub user_id: i64,
    pub date: DateTime<Utc>,
    pub reps: i64,
    pub sets: i64,
    pub duration: i64,
    pub difficulty: String,
    pub rest_period: Option<i64>,
    pub calories_burned: Option<f64>,
    pub form_notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSquatsLog {
    pub user_id: i64,
    pub date: DateTime<Utc>,
    pub reps: i64,
    pub sets: i64,
    pub duration: i64,
    pub weight: Option<i64>,
    pub rest_period: Option<i64>,
    pub calories_burned: Option<f64>,
    pub depth: Option<String>,
    pub form_notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPlanksLog {
    pub user_id: i64,
    pub date: DateTime<Utc>,
    pub duration: i64,
    pub stage: Option<String>,
    pub rest_period: Option<i64>,
    pub calories_burned: Option<f64>,
    pub form_notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewLungesLog {
    pub user_id: i64,
    pub date: DateTime<Utc>,
    pub reps: i64,
    pub sets: i64,
    pub duration: i64,
    pub weight: Option<i64>,
    pub rest_period: Option<i64>,
    pub calories_burned: Option<f64>,
    pub stance: Option<String>,
    pub form_notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPullupsLog {
    pub user_id: i64,
    pub date: DateTime<Utc>,
    pub reps: i64,
    pub sets: i64,
    pub duration: i64,
    pub difficulty: String,
    pub rest_period: Option<i64>,
    pub calories_burned: Option<f64>,
    pub grip_type: Option<String>,
    pub form_notes: Option<String>,
}
