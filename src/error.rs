//! # API Error Responses
//!
//! Single error shape for the HTTP boundary. Every failure leaves the
//! service as a problem+json body with a stable SCREAMING_SNAKE_CASE
//! `code`, a human-readable message, and the trace id of the delivery
//! that produced it.

use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::telemetry;

/// Error body returned by every non-2xx response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// Status for the response, not part of the body
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Stable machine-readable code
    pub code: String,
    /// Human-readable description
    pub message: String,
    /// Field-level details, present for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggested retry delay in seconds
    pub retry_after: Option<u64>,
    /// Correlation id for matching the response to server logs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl ApiError {
    /// Error with the given status, code and message. The trace id is
    /// captured from the active delivery when one is running.
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
            retry_after: None,
            trace_id: correlation_id(),
        }
    }

    /// Attach field-level details
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach a Retry-After hint
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }
}

/// Trace id of the running delivery, or a fresh correlation id so the
/// response can still be matched to logs
fn correlation_id() -> Option<String> {
    telemetry::current_trace_id()
        .or_else(|| Some(format!("corr-{}", &uuid::Uuid::new_v4().to_string()[..8])))
}

/// Catalogue of plain status-only errors
#[derive(Debug, Clone, Copy, Error)]
pub enum ErrorType {
    #[error("Bad Request")]
    BadRequest,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not Found")]
    NotFound,
    #[error("Conflict")]
    Conflict,
    #[error("Internal Server Error")]
    InternalServerError,
    #[error("Service Unavailable")]
    ServiceUnavailable,
}

impl ErrorType {
    /// Status and stable code for this error
    pub fn parts(self) -> (StatusCode, &'static str) {
        match self {
            ErrorType::BadRequest => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            ErrorType::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ErrorType::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorType::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            ErrorType::InternalServerError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR")
            }
            ErrorType::ServiceUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
        }
    }
}

impl From<ErrorType> for ApiError {
    fn from(kind: ErrorType) -> Self {
        let (status, code) = kind.parts();
        Self::new(status, code, kind.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        if let Some(seconds) = self.retry_after
            && let Ok(value) = HeaderValue::from_str(&seconds.to_string())
        {
            headers.insert(header::RETRY_AFTER, value);
        }

        (self.status, headers, axum::Json(self)).into_response()
    }
}

fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    use sea_orm::RuntimeErr;

    let sqlx_error = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(inner))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(inner)) => inner,
        _ => return false,
    };
    let Some(db_error) = sqlx_error.as_database_error() else {
        return false;
    };
    // Postgres reports 23505, SQLite 1555 (primary key) or 2067 (unique)
    db_error.is_unique_violation()
        || db_error
            .code()
            .is_some_and(|code| matches!(code.as_ref(), "23505" | "1555" | "2067"))
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(error: sea_orm::DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(error = %error, "unique constraint violation");
            return Self::new(StatusCode::CONFLICT, "CONFLICT", "Resource already exists");
        }

        match error {
            sea_orm::DbErr::RecordNotFound(what) => Self::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Record not found: {what}"),
            ),
            sea_orm::DbErr::Conn(error) => {
                tracing::error!(error = %error, "database connection failed");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Database service unavailable",
                )
            }
            error => {
                tracing::error!(error = %error, "database operation failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Database error occurred",
                )
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match &rejection {
            JsonRejection::MissingJsonContentType(_) => {
                "Missing 'Content-Type: application/json' header".to_string()
            }
            JsonRejection::JsonSyntaxError(error) => format!("JSON syntax error: {error}"),
            JsonRejection::JsonDataError(error) => format!("Invalid JSON: {error}"),
            _ => "Invalid request body".to_string(),
        };
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        tracing::error!(error = ?error, "unhandled internal error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "An internal error occurred",
        )
    }
}

/// 401 with an optional message override
pub fn unauthorized(message: Option<&str>) -> ApiError {
    ApiError::new(
        StatusCode::UNAUTHORIZED,
        "UNAUTHORIZED",
        message.unwrap_or("Authentication required"),
    )
}

/// 400 with field-level details
pub fn validation_error(message: &str, details: serde_json::Value) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message).with_details(details)
}
