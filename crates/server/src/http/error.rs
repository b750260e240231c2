//! Mapping classified errors onto HTTP responses.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use resilience::{ClassifiedError, ErrorKind};
use serde_json::json;
use tracing::{error, warn};

/// A failed request: `{success: false, error, code}`.
///
/// VALIDATION_ERROR renders as 400, every other kind as 500.
/// Non-operational errors show their safe user message, never the
/// internal one.
#[derive(Debug)]
pub struct ApiError {
    error: ClassifiedError,
    empty_data: bool,
}

impl ApiError {
    /// Also include `data: []` in the body (search endpoints).
    pub fn with_empty_data(mut self) -> Self {
        self.empty_data = true;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<ClassifiedError> for ApiError {
    fn from(error: ClassifiedError) -> Self {
        Self {
            error,
            empty_data: false,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ClassifiedError::validation(format!("Invalid request body: {}", rejection.body_text())).into()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ClassifiedError::validation(format!("Invalid query string: {}", rejection.body_text())).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = &self.error;

        let message = if err.is_operational() {
            err.message()
        } else {
            error!(
                kind = %err.kind(),
                severity = ?err.severity(),
                context = ?err.context(),
                captured_at = %err.captured_at(),
                "Request failed: {}",
                err.message()
            );
            err.user_message()
        };
        if err.is_operational() && status.is_server_error() {
            warn!(kind = %err.kind(), "Request failed: {}", err.message());
        }

        let mut body = json!({
            "success": false,
            "error": message,
            "code": err.kind().code(),
        });
        if self.empty_data {
            body["data"] = json!([]);
        }

        (status, Json(body)).into_response()
    }
}
