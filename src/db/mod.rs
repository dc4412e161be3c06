// SPDX-License-Identifier: MIT

//! SQLite database layer with typed operations.
//!
//! Provides high-level operations for:
//! - Users (signup lookups and creation)
//! - Workout logs (one insert + one query-by-user per exercise table)

use crate::error::Result;
use crate::models::{
    LungesLog, NewLungesLog, NewPlanksLog, NewPullupsLog, NewPushupsLog, NewSquatsLog, NewUser,
    PlanksLog, PullupsLog, PushupsLog, SquatsLog, User,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// SQLite database client.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database at the configured URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        tracing::info!(url = database_url, "Connected to SQLite");

        Ok(Self { pool })
    }

    /// Open an in-memory database for tests.
    ///
    /// A single connection keeps the in-memory database alive and shared
    /// across all operations on the pool.
    pub async fn new_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Run embedded schema migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| crate::error::AppError::Internal(anyhow::anyhow!(e)))?;
        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Insert a new user and return its id.
    pub async fn create_user(&self, user: &NewUser) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, age, gender, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.age)
        .bind(&user.gender)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn user_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Number of user rows; used by tests to assert rejected signups
    /// leave the table untouched.
    pub async fn count_users(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    // ─── Push-up Logs ────────────────────────────────────────────

    pub async fn insert_pushups_log(&self, log: &NewPushupsLog) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO pushups_logs
                 (user_id, date, reps, sets, duration, difficulty, rest_period,
                  calories_burned, form_notes)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(log.user_id)
        .bind(log.date)
        .bind(log.reps)
        .bind(log.sets)
        .bind(log.duration)
        .bind(&log.difficulty)
        .bind(log.rest_period)
        .bind(log.calories_burned)
        .bind(&log.form_notes)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn pushups_logs_for_user(&self, user_id: i64) -> Result<Vec<PushupsLog>> {
        let logs = sqlx::query_as::<_, PushupsLog>(
            "SELECT * FROM pushups_logs WHERE user_id = ? ORDER BY date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }

    // ─── Squat Logs ──────────────────────────────────────────────

    pub async fn insert_squats_log(&self, log: &NewSquatsLog) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO squats_logs
                 (user_id, date, reps, sets, duration, weight, rest_period,
                  calories_burned, depth, form_notes)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(log.user_id)
        .bind(log.date)
        .bind(log.reps)
        .bind(log.sets)
        .bind(log.duration)
        .bind(log.weight)
        .bind(log.rest_period)
        .bind(log.calories_burned)
        .bind(&log.depth)
        .bind(&log.form_notes)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn squats_logs_for_user(&self, user_id: i64) -> Result<Vec<SquatsLog>> {
        let logs = sqlx::query_as::<_, SquatsLog>(
            "SELECT * FROM squats_logs WHERE user_id = ? ORDER BY date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }

    // ─── Plank Logs ──────────────────────────────────────────────

    pub async fn insert_planks_log(&self, log: &NewPlanksLog) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO planks_logs
                 (user_id, date, duration, stage, rest_period, calories_burned, form_notes)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(log.user_id)
        .bind(log.date)
        .bind(log.duration)
        .bind(&log.stage)
        .bind(log.rest_period)
        .bind(log.calories_burned)
        .bind(&log.form_notes)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn planks_logs_for_user(&self, user_id: i64) -> Result<Vec<PlanksLog>> {
        let logs = sqlx::query_as::<_, PlanksLog>(
            "SELECT * FROM planks_logs WHERE user_id = ? ORDER BY date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }

    // ─── Lunge Logs ──────────────────────────────────────────────

    pub async fn insert_lunges_log(&self, log: &NewLungesLog) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO lunges_logs
                 (user_id, date, reps, sets, duration, weight, rest_period,
                  calories_burned, stance, form_notes)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(log.user_id)
        .bind(log.date)
        .bind(log.reps)
        .bind(log.sets)
        .bind(log.duration)
        .bind(log.weight)
        .bind(log.rest_period)
        .bind(log.calories_burned)
        .bind(&log.stance)
        .bind(&log.form_notes)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn lunges_logs_for_user(&self, user_id: i64) -> Result<Vec<LungesLog>> {
        let logs = sqlx::query_as::<_, LungesLog>(
            "SELECT * FROM lunges_logs WHERE user_id = ? ORDER BY date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }

    // ─── Pull-up Logs ────────────────────────────────────────────

    pub async fn insert_pullups_log(&self, log: &NewPullupsLog) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO pullups_logs
                 (user_id, date, reps, sets, duration, difficulty, rest_period,
                  calories_burned, grip_type, form_notes)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(log.user_id)
        .bind(log.date)
        .bind(log.reps)
        .bind(log.sets)
        .bind(log.duration)
        .bind(&log.difficulty)
        .bind(log.rest_period)
        .bind(log.calories_burned)
        .bind(&log.grip_type)
        .bind(&log.form_notes)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn pullups_logs_for_user(&self, user_id: i64) -> Result<Vec<PullupsLog>> {
        let logs = sqlx::query_as::<_, PullupsLog>(
            "SELECT * FROM pullups_logs WHERE user_id = ? ORDER BY date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }
}
