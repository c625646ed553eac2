// HTTP error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body shared by every 404, so a missing object and a rejected key look the same
pub const NOT_FOUND_MESSAGE: &str = "Not found";

/// Result type for HTTP handlers
pub type AppResult<T> = Result<T, AppError>;

/// Application error with HTTP status code
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for AppError {}

/// Error response JSON structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Json(ErrorResponse {
            error: self.message,
            status: status.as_u16(),
        });

        (status, body).into_response()
    }
}

/// Convert hlsgate_core errors to HTTP errors
impl From<hlsgate_core::Error> for AppError {
    fn from(err: hlsgate_core::Error) -> Self {
        use hlsgate_core::Error;

        match err {
            Error::NotFound(msg) => {
                tracing::debug!("Object not found: {}", msg);
                Self::not_found()
            }
            Error::PathTraversal(msg) => {
                tracing::warn!("Rejected key: {}", msg);
                Self::not_found()
            }
            Error::Store(msg) => {
                tracing::error!("Object store error: {}", msg);
                Self::bad_gateway("Upstream storage error")
            }
            Error::Timeout(limit) => {
                tracing::error!("Object store call exceeded {:?}", limit);
                Self::gateway_timeout("Upstream storage timed out")
            }
            Error::MalformedPlaylist(msg) => {
                tracing::warn!("Malformed playlist: {}", msg);
                Self::bad_gateway("Malformed playlist")
            }
            Error::Config(msg) | Error::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                Self::internal("Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlsgate_core::Error;
    use std::time::Duration;

    #[test]
    fn test_not_found_and_traversal_are_indistinguishable() {
        let missing = AppError::from(Error::NotFound("hls/a/x.ts".to_string()));
        let escaped = AppError::from(Error::PathTraversal("../../secret".to_string()));

        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.status, escaped.status);
        assert_eq!(missing.message, escaped.message);
    }

    #[test]
    fn test_upstream_failures() {
        assert_eq!(
            AppError::from(Error::Store("connection reset".to_string())).status,
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(Error::Timeout(Duration::from_secs(10))).status,
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::from(Error::MalformedPlaylist("bad utf-8".to_string())).status,
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_store_detail_not_leaked() {
        let err = AppError::from(Error::Store("secret-key AKID... rejected".to_string()));
        assert!(!err.message.contains("AKID"));
    }
}
