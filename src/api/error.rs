use crate::errors::Error as CoreError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Error returned by every handler.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Failure reported by the business logic
    #[error("{0}")]
    Core(#[from] CoreError),
    /// The caller did not identify themselves
    #[error("{0}")]
    Unauthorized(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Core(e) => match e {
                CoreError::Validation { .. } | CoreError::InvalidAmount { .. } => {
                    (StatusCode::BAD_REQUEST, e.to_string())
                }
                CoreError::GoalNotFound { .. } | CoreError::ProfileNotFound { .. } => {
                    (StatusCode::NOT_FOUND, e.to_string())
                }
                CoreError::DuplicateTransaction { .. } => (StatusCode::CONFLICT, e.to_string()),
                CoreError::Database(_)
                | CoreError::Upstream { .. }
                | CoreError::UpstreamTimeout { .. }
                | CoreError::Config { .. }
                | CoreError::Io(_)
                | CoreError::EnvVar(_) => {
                    error!("Request failed: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
            Self::Unauthorized(reason) => (StatusCode::UNAUTHORIZED, reason.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message,
        });
        (status, body).into_response()
    }
}

/// Result type returned by handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: CoreError) -> StatusCode {
        ApiError::from(error).status_and_message().0
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(CoreError::validation("bad")), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(CoreError::InvalidAmount { amount: 0.5 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(CoreError::GoalNotFound { id: 7 }), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(CoreError::ProfileNotFound {
                user_id: "alice".to_string()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(CoreError::DuplicateTransaction {
                transaction_id: "t-1".to_string()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(CoreError::UpstreamTimeout { seconds: 20 }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Unauthorized("no".to_string()).status_and_message().0,
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let (_, message) =
            ApiError::from(CoreError::upstream("secret backend detail")).status_and_message();
        assert_eq!(message, "Internal server error");
    }
}
