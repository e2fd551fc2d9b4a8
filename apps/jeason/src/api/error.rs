//! # API Errors
//!
//! Maps every failure a handler can hit onto a status code and a JSON body.
//!
//! | Error                 | Status | Body                         |
//! |-----------------------|--------|------------------------------|
//! | validation            | 400    | `{error, fields}`            |
//! | unauthorized          | 401    | `{error, login}`             |
//! | forbidden             | 403    | `{error}`                    |
//! | not found             | 404    | `{error}`                    |
//! | conflict              | 409    | `{error}`                    |
//! | rate limited          | 429    | `{error}`                    |
//! | provider failure      | 502    | `{error}` (generic)          |
//! | email failure         | 502    | `{error}` (generic)          |
//! | storage / internal    | 500    | `{error}` (generic, logged)  |

use crate::files::FileError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use jeason_core::CoreError;
use jeason_core::routes::LOGIN_PATH;
use serde_json::json;
use thiserror::Error;
use tracing::error;

const INTERNAL: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    File(#[from] FileError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Too many requests, please try again shortly")]
    RateLimited,

    /// Payment provider failure. The detail is logged, not returned.
    #[error("Payment provider error")]
    Provider(String),

    /// Email API failure. The detail is logged, not returned.
    #[error("Notification error")]
    Notification(String),

    #[error("Internal server error")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

fn body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Core(CoreError::Validation(fields)) => {
                let message = match fields.iter().next() {
                    Some((_, only)) if fields.len() == 1 => only.to_string(),
                    _ => "Please correct the highlighted fields".to_string(),
                };
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": message, "fields": fields })),
                )
                    .into_response()
            }
            ApiError::Core(CoreError::Unauthorized(message)) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": message, "login": LOGIN_PATH })),
            )
                .into_response(),
            ApiError::Core(CoreError::Forbidden(message)) => body(StatusCode::FORBIDDEN, &message),
            ApiError::Core(err @ CoreError::NotFound(_)) => {
                body(StatusCode::NOT_FOUND, &err.to_string())
            }
            ApiError::Core(CoreError::Conflict(message)) => body(StatusCode::CONFLICT, &message),
            ApiError::Core(err @ (CoreError::Storage(_) | CoreError::Format(_))) => {
                error!("store failure: {err}");
                body(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL)
            }
            ApiError::File(FileError::NotFound) => body(StatusCode::NOT_FOUND, "File not found"),
            ApiError::File(FileError::Io(err)) => {
                error!("file store failure: {err}");
                body(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL)
            }
            ApiError::File(err) => body(StatusCode::BAD_REQUEST, &err.to_string()),
            ApiError::BadRequest(message) => body(StatusCode::BAD_REQUEST, &message),
            ApiError::RateLimited => body(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests, please try again shortly",
            ),
            ApiError::Provider(detail) => {
                error!("provider failure: {detail}");
                body(
                    StatusCode::BAD_GATEWAY,
                    "Could not reach the payment provider, please try again",
                )
            }
            ApiError::Notification(detail) => {
                error!("notification failure: {detail}");
                body(
                    StatusCode::BAD_GATEWAY,
                    "Could not send the notification email, please try again",
                )
            }
            ApiError::Internal(detail) => {
                error!("internal failure: {detail}");
                body(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (
                ApiError::Core(CoreError::field("amount", "Amount is required")),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::Core(CoreError::Unauthorized("no".into())), StatusCode::UNAUTHORIZED),
            (ApiError::Core(CoreError::Forbidden("no".into())), StatusCode::FORBIDDEN),
            (ApiError::Core(CoreError::NotFound("product 1".into())), StatusCode::NOT_FOUND),
            (ApiError::Core(CoreError::Conflict("dup".into())), StatusCode::CONFLICT),
            (ApiError::Core(CoreError::Storage("disk".into())), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::File(FileError::InvalidPath), StatusCode::BAD_REQUEST),
            (ApiError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (ApiError::Provider("502 from upstream".into()), StatusCode::BAD_GATEWAY),
            (ApiError::Notification("422 from email API".into()), StatusCode::BAD_GATEWAY),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
