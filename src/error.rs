use thiserror::Error;

use crate::models::assignment_request::RequestStatus;

/// Failures raised by a backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("malformed record: {0}")]
    Malformed(String),
}

impl StoreError {
    pub fn malformed<M: Into<String>>(message: M) -> Self {
        Self::Malformed(message.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Tagged outcome of every engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("failed to fetch data: {0}")]
    FetchFailed(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("request {request_id} is already {status}")]
    InvalidStateTransition { request_id: String, status: RequestStatus },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("not allowed to {0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),
}

impl CoreError {
    pub fn validation<M: Into<String>>(message: M) -> Self {
        Self::ValidationError(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::FetchFailed(_) => "fetch_failed",
            Self::ValidationError(_) => "validation_error",
            Self::InvalidStateTransition { .. } => "invalid_state_transition",
            Self::MalformedResponse(_) => "malformed_response",
            Self::NotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::Unauthorized(_) => "unauthorized",
        }
    }

    /// Malformed payloads propagate like any other failed read.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::FetchFailed(_) | Self::MalformedResponse(_))
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Malformed(message) => Self::MalformedResponse(message),
            other => Self::FetchFailed(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("failed to load seed file {path}: {reason}")]
    Seed { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_store_records_surface_as_fetch_failures() {
        let err: CoreError = StoreError::malformed("status column").into();
        assert_eq!(err.code(), "malformed_response");
        assert!(err.is_fetch_failure());
    }

    #[test]
    fn database_errors_map_to_fetch_failed() {
        let err: CoreError = StoreError::Database(sqlx::Error::PoolClosed).into();
        assert!(matches!(err, CoreError::FetchFailed(_)));
        assert!(!CoreError::validation("x").is_fetch_failure());
    }
}
