//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Centralizes HTTP error response construction to keep error shapes uniform
//! across backend endpoints, including gate denials.
//!
//! # Key invariants and assumptions
//! - Error responses must include a stable `code` and human-readable `message`.
//! - Status codes must align with the error category.
//!
//! # Security considerations
//! - Internal errors log details server-side but return generic messages.
//! - Gate denials never name the channel that failed or the roles that would
//!   have passed.
use crate::api::types::ErrorResponse;
use crate::auth::identity::IdentityError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use waitress_authz::DenyReason;

/// Structured API error returned by handlers.
///
/// # Invariants
/// - `status` must match the semantics of `body.code`.
///
/// # Example
/// ```rust
/// use axum::http::StatusCode;
/// use backend::api::error::ApiError;
/// use backend::api::types::ErrorResponse;
///
/// let err = ApiError {
///     status: StatusCode::NOT_FOUND,
///     body: ErrorResponse {
///         code: "not_found".to_string(),
///         message: "missing".to_string(),
///         request_id: None,
///     },
/// };
/// ```
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn api_error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        },
    }
}

/// Build a 409 Conflict error with a caller-provided code.
pub fn api_conflict(code: &str, message: &str) -> ApiError {
    api_error(StatusCode::CONFLICT, code, message)
}

/// Build a 500 Internal Server Error from an identity store error.
///
/// Logs the store error and returns a generic message.
pub fn api_internal(message: &str, err: &IdentityError) -> ApiError {
    tracing::error!(error = ?err, "identity store error");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

/// Build a 500 Internal Server Error without an underlying store error.
pub fn api_internal_message(message: &str) -> ApiError {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

/// Build a 401 Unauthorized error.
pub fn api_unauthorized(message: &str) -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

/// Build a 403 Forbidden error.
pub fn api_forbidden(message: &str) -> ApiError {
    api_error(StatusCode::FORBIDDEN, "forbidden", message)
}

/// Build a 400 Bad Request validation error.
pub fn api_validation_error(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "validation_error", message)
}

/// Map a gate denial to its generic client-facing error.
///
/// | reason            | status |
/// |-------------------|--------|
/// | `Unauthenticated` | 401    |
/// | `Forbidden`       | 403    |
/// | `Configuration`   | 500    |
pub fn api_denied(reason: DenyReason) -> ApiError {
    match reason {
        DenyReason::Unauthenticated => api_unauthorized("authentication required"),
        DenyReason::Forbidden => api_forbidden("not permitted"),
        DenyReason::Configuration => api_internal_message("internal server error"),
    }
}
