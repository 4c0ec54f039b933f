//! Per-user settings: the AI service API key.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::super::error::ApiError;
use super::super::session::CurrentUser;
use super::super::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    api_key: String,
}

/// GET /api/user/settings
pub async fn get(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let account = state
        .ctx
        .users()
        .get(user.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(json!({
        "api_key": account.api_key.unwrap_or_default(),
    })))
}

/// POST /api/user/settings
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<UpdateSettingsRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let key = req.api_key.trim();
    let key = (!key.is_empty()).then_some(key);
    state.ctx.users().set_api_key(user.id, key).await?;

    Ok(Json(json!({ "status": "success" })))
}
