//! Registration, login, and session endpoints.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::super::error::ApiError;
use super::super::session::{session_cookie, CurrentUser, SESSION_COOKIE};
use super::super::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
        .to_string();

    let created = state
        .ctx
        .users()
        .create(username, &password_hash)
        .await?;

    match created {
        Some(user) => {
            info!("registered user {}", user.username);
            Ok((
                StatusCode::CREATED,
                Json(json!({ "status": "success", "message": "User registered successfully." })),
            ))
        }
        None => Err(ApiError::BadRequest("Username already exists".to_string())),
    }
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .ctx
        .users()
        .find_by_username(req.username.trim())
        .await?;

    let Some(user) = user else {
        return Err(ApiError::Unauthorized);
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash invalid: {}", e)))?;
    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(ApiError::Unauthorized);
    }

    let session_id = state.sessions.create(user.id, &user.username);
    let jar = jar.add(session_cookie(session_id));

    Ok((
        jar,
        Json(json!({ "status": "success", "username": user.username })),
    ))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    _user: CurrentUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.remove(cookie.value());
    }
    let jar = jar.remove(Cookie::from(SESSION_COOKIE));

    Ok((jar, Json(json!({ "status": "success" }))))
}

/// GET /api/auth/status
pub async fn status(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let session = jar
        .get(SESSION_COOKIE)
        .and_then(|c| state.sessions.get(c.value()));

    match session {
        Some(session) => Json(json!({
            "isLoggedIn": true,
            "username": session.username,
        })),
        None => Json(json!({ "isLoggedIn": false })),
    }
}
