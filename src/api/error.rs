//! HTTP error mapping
//!
//! | Code  | Status | Meaning                          |
//! |-------|--------|----------------------------------|
//! | E0002 | 400    | malformed input                  |
//! | E0003 | 404    | item missing or not owned        |
//! | E3001 | 401    | no caller identity               |
//! | E9002 | 500    | storage failure                  |
//! | E9001 | 500    | anything else                    |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::BacklogError;

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<BacklogError> for ApiError {
    fn from(e: BacklogError) -> Self {
        match e {
            BacklogError::ItemNotFound(id) => {
                Self::NotFound(format!("Backlog item {} not found", id))
            }
            e if e.is_client_error() => Self::Validation(e.to_string()),
            BacklogError::StorageError(msg) => Self::Storage(msg),
            BacklogError::IoError(e) => Self::Storage(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "E3001",
                "Authentication required".to_string(),
            ),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "E0002", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003", msg.clone()),
            ApiError::Storage(msg) => {
                error!(target: "storage", error = %msg, "Storage error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "E9002", "Storage error".to_string())
            }
            ApiError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "E9001", "Internal server error".to_string())
            }
        };

        let body = Json(ErrorBody {
            code: code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backlog_error_mapping() {
        assert!(matches!(
            ApiError::from(BacklogError::ItemNotFound("x".into())),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(BacklogError::InvalidCategory("movies".into())),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from(BacklogError::InvalidItemId("1".into())),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from(BacklogError::StorageError("locked".into())),
            ApiError::Storage(_)
        ));
        assert!(matches!(
            ApiError::from(BacklogError::Other("boom".into())),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthorized.into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Validation("bad".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("gone".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Storage("disk".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
