//! API error type and its JSON rendering

use crate::error::EvalError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors returned to HTTP clients
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    /// Convert a service error, replacing server-side failures with `message`
    ///
    /// Client errors keep their own message; the original server error is
    /// logged.
    pub fn masked(err: EvalError, message: &str) -> Self {
        match ApiError::from(err) {
            ApiError::Internal(detail) => {
                error!("{}: {}", message, detail);
                ApiError::Internal(message.to_string())
            }
            other => other,
        }
    }
}

impl From<EvalError> for ApiError {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            EvalError::InvalidInput(msg) => ApiError::BadRequest(msg),
            EvalError::InvalidId(e) => ApiError::BadRequest(format!("invalid id: {}", e)),
            EvalError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            other => {
                error!("Request failed: {}", other);
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_errors_map_to_status() {
        let cases = [
            (EvalError::not_found("project", "x"), StatusCode::NOT_FOUND),
            (EvalError::InvalidInput("bad".into()), StatusCode::BAD_REQUEST),
            (EvalError::Unauthorized("no".into()), StatusCode::UNAUTHORIZED),
            (EvalError::Database("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_masking_hides_server_detail_only() {
        let masked = ApiError::masked(EvalError::LlmApi("key=abc".into()), "분석 중 오류가 발생했습니다.");
        assert!(matches!(masked, ApiError::Internal(ref m) if m == "분석 중 오류가 발생했습니다."));

        let kept = ApiError::masked(EvalError::InvalidInput("프로젝트 ID가 필요합니다.".into()), "x");
        assert!(matches!(kept, ApiError::BadRequest(ref m) if m == "프로젝트 ID가 필요합니다."));
    }
}
