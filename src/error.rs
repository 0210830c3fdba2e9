//! Error taxonomy shared by the search pipeline, the chat layer, and the HTTP
//! surface.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppError {
    /// Bad or missing input. Reported to the caller only.
    #[error("{0}")]
    Validation(String),

    /// Credential missing, malformed, expired, or bound to an unknown identity.
    #[error("authentication error: {0}")]
    Auth(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// The relevance model could not be loaded or failed mid-inference.
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    /// A server-side task panicked or was cancelled.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
        }
        (
            status,
            Json(ErrorBody {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::validation("q is required").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Auth("expired".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::not_found("event", "42").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::persistence("disk full").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Internal("task panicked".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = AppError::not_found("room", "group-7");
        assert_eq!(err.to_string(), "room not found: group-7");
    }
}
