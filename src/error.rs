use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            // A missing document on update is reported like any other storage failure.
            Self::NotFound(_)
            | Self::Storage(_)
            | Self::HttpRequest(_)
            | Self::Serialization(_)
            | Self::Internal(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            Self::Unauthorized(ref msg) => tracing::warn!("Rejected request: {}", msg),
            Self::BadRequest(ref msg) => tracing::debug!("Bad request: {}", msg),
            Self::Storage(ref msg) => tracing::error!("Storage error: {}", msg),
            Self::HttpRequest(ref e) => tracing::error!("HTTP request error: {}", e),
            Self::Serialization(ref e) => tracing::error!("Serialization error: {}", e),
            Self::Other(ref e) => tracing::error!("Unexpected error: {}", e),
            ref other => tracing::error!("{}", other),
        }

        let body = Json(json!({
            "ok": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
