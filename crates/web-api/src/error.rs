//! 统一的错误响应信封：`{"success": false, "message": ..., "error": CODE}`

use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    error: &'static str,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    retry_after: Option<u64>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, code, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn too_many_requests(retry_after: u64) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            code: "RATE_LIMIT_EXCEEDED",
            message: "Too many requests. Please try again later.".to_string(),
            retry_after: Some(retry_after),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use domain::DomainError;

        match error {
            ApplicationError::Domain(DomainError::Validation { field, message }) => {
                ApiError::bad_request(format!("{field}: {message}"))
            }
            ApplicationError::Domain(DomainError::NotFound { resource, .. }) => {
                ApiError::not_found(format!("{resource} not found"))
            }
            ApplicationError::Domain(DomainError::AlreadyExists { resource, .. }) => {
                ApiError::new(
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    format!("{resource} already exists"),
                )
            }
            ApplicationError::Domain(DomainError::PermissionDenied { action }) => {
                ApiError::forbidden("ACCESS_DENIED", format!("not allowed to {action}"))
            }
            ApplicationError::Domain(DomainError::Database { message }) => {
                tracing::error!(error = %message, "storage failure");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    format!("database error: {message}"),
                )
            }
            ApplicationError::Password(err) => {
                tracing::error!(error = %err, "password hashing failure");
                ApiError::internal("password processing failed")
            }
            ApplicationError::Authentication => ApiError::unauthorized(
                "AUTHENTICATION_FAILED",
                "Invalid email or password",
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            message: self.message,
            error: self.code,
            retry_after: self.retry_after,
        };
        (self.status, Json(body)).into_response()
    }
}
