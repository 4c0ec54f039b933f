//! User accounts and their search keywords.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account. Owns keywords and articles exclusively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Database row ID.
    pub id: i32,
    /// Login name, unique across the instance.
    pub username: String,
    /// Argon2 hash of the password.
    pub password_hash: String,
    /// Per-user key for the AI analysis service.
    pub api_key: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// A search term scoped to one user. The (owner, text) pair is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyword {
    pub id: i32,
    pub user_id: i32,
    pub keyword: String,
    pub created_at: DateTime<Utc>,
}
