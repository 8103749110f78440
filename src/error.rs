// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Client mistakes (validation, bad input) use the `"fail"` status, everything
//! else uses `"error"`. Server-side failures are logged and never leak details.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Access to this resource is forbidden")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn user_not_found() -> Self {
        AppError::NotFound("User not found".to_string())
    }

    pub fn topic_not_found() -> Self {
        AppError::NotFound("Topic not found".to_string())
    }

    pub fn material_not_found() -> Self {
        AppError::NotFound("Material not found".to_string())
    }

    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (envelope, error, message, details) = match &self {
            AppError::Unauthorized => ("error", "unauthorized", Some(self.to_string()), None),
            AppError::InvalidToken => ("error", "invalid_token", Some(self.to_string()), None),
            AppError::Forbidden => ("error", "forbidden", Some(self.to_string()), None),
            AppError::NotFound(msg) => ("error", "not_found", Some(msg.clone()), None),
            AppError::BadRequest(msg) => ("fail", "bad_request", None, Some(msg.clone())),
            AppError::Validation(msg) => ("fail", "validation_error", None, Some(msg.clone())),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                ("error", "database_error", Some("Something went wrong".to_string()), None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                ("error", "internal_error", Some("Something went wrong".to_string()), None)
            }
        };

        let body = ErrorResponse {
            status: envelope,
            error,
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_uses_fail_envelope() {
        let (status, json) = body_json(AppError::Validation("rating: out of range".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["status"], "fail");
        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["details"], "rating: out of range");
    }

    #[tokio::test]
    async fn not_found_carries_message() {
        let (status, json) = body_json(AppError::topic_not_found()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Topic not found");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, json) =
            body_json(AppError::Database("connection reset by peer".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Something went wrong");
        assert!(json.get("details").is_none());
    }
}
