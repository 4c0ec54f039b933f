//! HTTP error mapping for the JSON API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use crate::arxiv::SourceError;
use crate::repository::DieselError;

/// Errors surfaced to API callers as JSON `{"error": ...}` bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid request field.
    #[error("{0}")]
    BadRequest(String),
    /// No valid session.
    #[error("authentication required")]
    Unauthorized,
    /// Entity missing or not visible to the caller.
    #[error("not found")]
    NotFound,
    /// The paper source couldn't be reached.
    #[error("paper source unavailable: {0}")]
    Upstream(String),
    /// Anything else; logged, details withheld from the response.
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<DieselError> for ApiError {
    fn from(e: DieselError) -> Self {
        Self::Internal(e.into())
    }
}

impl From<SourceError> for ApiError {
    fn from(e: SourceError) -> Self {
        Self::Upstream(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(e) => {
                error!("internal error: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
