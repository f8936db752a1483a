//! Shared error handling for API endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// API error type with automatic response conversion.
#[derive(Debug)]
pub enum ApiError {
    /// `{"error": ...}` body.
    Error(StatusCode, String),
    /// `{"message": ...}` body.
    Message(StatusCode, String),
    /// Body received from the Auth Service, passed through unchanged.
    Upstream(StatusCode, serde_json::Value),
}

impl ApiError {
    pub fn error(status: StatusCode, msg: impl Into<String>) -> Self {
        Self::Error(status, msg.into())
    }

    pub fn message(status: StatusCode, msg: impl Into<String>) -> Self {
        Self::Message(status, msg.into())
    }

    /// Pass an Auth Service rejection through. A missing body becomes `{}`.
    pub fn upstream(status: StatusCode, body: Option<serde_json::Value>) -> Self {
        Self::Upstream(status, body.unwrap_or_else(|| json!({})))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Error(status, _)
            | ApiError::Message(status, _)
            | ApiError::Upstream(status, _) => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Error(_, msg) => json!({ "error": msg }),
            ApiError::Message(_, msg) => json!({ "message": msg }),
            ApiError::Upstream(_, body) => body,
        };
        (status, Json(body)).into_response()
    }
}
