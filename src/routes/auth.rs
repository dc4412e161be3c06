// SPDX-License-Identifier: MIT

//! Account and session routes.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_session_token, SESSION_COOKIE};
use crate::models::NewUser;
use crate::AppState;

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;

/// Public routes: account creation and login.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

/// Routes that require an active session.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/logout", post(logout))
}

// ─── Signup ──────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(range(min = 13, max = 120))]
    pub age: i64,
    #[validate(length(min = 1, max = 32))]
    pub gender: String,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub user_id: i64,
    pub username: String,
}

/// Create a new account.
///
/// Username and email uniqueness are two independent checks; the first
/// match wins the rejection message.
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if state.db.user_by_username(&payload.username).await?.is_some() {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }
    if state.db.user_by_email(&payload.email).await?.is_some() {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;

    let user_id = state
        .db
        .create_user(&NewUser {
            username: payload.username.clone(),
            email: payload.email,
            password_hash,
            age: payload.age,
            gender: payload.gender,
        })
        .await?;

    tracing::info!(user_id, username = %payload.username, "User created");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id,
            username: payload.username,
        }),
    ))
}

// ─── Login / Logout ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub username: String,
}

/// Authenticate and set the session cookie.
///
/// Unknown user and wrong password collapse into one generic message.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let user = state
        .db
        .user_by_username(&payload.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.password_hash) {
        tracing::warn!(username = %payload.username, "Failed login attempt");
        return Err(AppError::InvalidCredentials);
    }

    let token = create_session_token(
        user.id,
        &user.username,
        &state.config.session_signing_key,
        state.config.session_ttl_minutes,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Session token creation failed: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(state.config.session_ttl_minutes))
        .build();

    tracing::info!(user_id = user.id, username = %user.username, "User logged in");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            user_id: user.id,
            username: user.username,
        }),
    ))
}

/// Expire the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let removal = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .build();

    (
        jar.remove(removal),
        Json(serde_json::json!({ "message": "Logged out" })),
    )
}

// ─── Password hashing ────────────────────────────────────────

/// Hash a password with a per-user random salt (argon2id, PHC string).
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash string.
fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_is_salted_and_verifiable() {
        let a = hash_password("correct horse battery").unwrap();
        let b = hash_password("correct horse battery").unwrap();

        // Random salts: same password, different hashes
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &a));
        assert!(verify_password("correct horse battery", &b));
    }

    #[test]
    fn test_verify_password_rejects_wrong_password() {
        let hash = hash_password("right password").unwrap();
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_verify_password_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
