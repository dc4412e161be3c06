// SPDX-License-Identifier: MIT

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Registered user account.
///
/// The password is stored as a salted argon2 PHC string, never in
/// plaintext.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    /// Unique login name
    pub username: String,
    /// Unique email address
    pub email: String,
    /// Argon2 PHC hash string (salt included)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub age: i64,
    pub gender: String,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a new user at signup.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub age: i64,
    pub gender: String,
}
