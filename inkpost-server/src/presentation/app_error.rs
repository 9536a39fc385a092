use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("not found")]
    NotFound,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

pub(crate) type AppResult<T> = Result<T, AppError>;

/// Failure bodies mirror the flash-message shape: a text plus the "fail"
/// category.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    category: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            AppError::Domain(err) => {
                let (status, msg) = match &err {
                    DomainError::Validation { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
                    DomainError::AlreadyExists(_) => (StatusCode::CONFLICT, err.to_string()),
                    DomainError::InvalidCredentials => (StatusCode::UNAUTHORIZED, err.to_string()),
                    DomainError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                    DomainError::Forbidden => (StatusCode::FORBIDDEN, err.to_string()),
                    DomainError::Unexpected(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal error".to_string(),
                    ),
                };
                (status, msg)
            }
            AppError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            ),
        };

        (
            status,
            Json(ErrorBody {
                error: msg,
                category: "fail",
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::AppError;
    use crate::domain::error::DomainError;

    #[test]
    fn domain_errors_map_to_expected_statuses() {
        let cases = [
            (
                AppError::Domain(DomainError::NotFound("post id: 1".to_string())),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::Domain(DomainError::Forbidden),
                StatusCode::FORBIDDEN,
            ),
            (
                AppError::Domain(DomainError::InvalidCredentials),
                StatusCode::UNAUTHORIZED,
            ),
            (
                AppError::Domain(DomainError::AlreadyExists("email".to_string())),
                StatusCode::CONFLICT,
            ),
            (
                AppError::Domain(DomainError::Validation {
                    field: "title",
                    message: "must be 1..255 chars",
                }),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
