//! Keyword management endpoints, owner scoped.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::super::error::ApiError;
use super::super::session::CurrentUser;
use super::super::AppState;

#[derive(Debug, Deserialize)]
pub struct AddKeywordRequest {
    #[serde(default)]
    keyword: String,
}

/// GET /api/keywords
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<String>>, ApiError> {
    let keywords = state.ctx.keywords().list_for_user(user.id).await?;
    Ok(Json(keywords.into_iter().map(|k| k.keyword).collect()))
}

/// POST /api/keywords
pub async fn add(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<AddKeywordRequest>,
) -> Result<Json<Vec<String>>, ApiError> {
    let keyword = req.keyword.trim();
    if keyword.is_empty() {
        return Err(ApiError::BadRequest("Keyword is required".to_string()));
    }

    state.ctx.keywords().add(user.id, keyword).await?;

    let keywords = state.ctx.keywords().list_for_user(user.id).await?;
    Ok(Json(keywords.into_iter().map(|k| k.keyword).collect()))
}

/// DELETE /api/keywords/:keyword
pub async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(keyword): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.ctx.keywords().remove(user.id, &keyword).await?;
    Ok(Json(json!({ "success": true })))
}
