//! Cookie-backed session management.
//!
//! Sessions live in process memory keyed by a random id carried in an
//! HttpOnly cookie; restarting the server logs everyone out, which is
//! acceptable for a personal tool.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use uuid::Uuid;

use super::error::ApiError;
use super::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "paperdesk_session";

#[derive(Debug, Clone)]
pub struct SessionData {
    pub user_id: i32,
    pub username: String,
}

/// In-memory session store.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionData>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session and return its id.
    pub fn create(&self, user_id: i32, username: &str) -> String {
        let session_id = Uuid::new_v4().to_string();
        let data = SessionData {
            user_id,
            username: username.to_string(),
        };

        if let Ok(mut sessions) = self.sessions.write() {
            sessions.insert(session_id.clone(), data);
        }

        session_id
    }

    pub fn get(&self, session_id: &str) -> Option<SessionData> {
        self.sessions
            .read()
            .ok()
            .and_then(|s| s.get(session_id).cloned())
    }

    pub fn remove(&self, session_id: &str) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(session_id);
        }
    }
}

/// Build the session cookie for a login response.
pub fn session_cookie(session_id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .build()
}

/// The authenticated caller, extracted from the session cookie.
///
/// Rejects with 401 when the cookie is missing or the session unknown.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Unauthorized)?;

        let session_id = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(ApiError::Unauthorized)?;

        let session = state
            .sessions
            .get(&session_id)
            .ok_or(ApiError::Unauthorized)?;

        Ok(CurrentUser {
            id: session.user_id,
            username: session.username,
        })
    }
}
