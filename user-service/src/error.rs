//! Error types and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::store::StoreError;

// ============================================================================
// Structured Service Errors
// ============================================================================

/// Service operation being performed when the error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceOperation {
    /// Fetching the whole collection
    FindAll,
    /// Paginated, filtered listing
    FindAllWithPagination,
    /// Creating an entity
    Create,
    /// Fetching one entity by identifier
    FindById,
    /// Updating one entity by identifier
    UpdateById,
    /// Deleting one entity by identifier
    DeleteById,
}

impl fmt::Display for ServiceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FindAll => write!(f, "find_all"),
            Self::FindAllWithPagination => write!(f, "find_all_with_pagination"),
            Self::Create => write!(f, "create"),
            Self::FindById => write!(f, "find_by_id"),
            Self::UpdateById => write!(f, "update_by_id"),
            Self::DeleteById => write!(f, "delete_by_id"),
        }
    }
}

/// Category of service error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceErrorKind {
    /// The entity addressed by an existence check does not exist
    NotFound,
    /// The query or request body could not be normalized or validated
    MalformedQuery,
    /// The document store failed
    StoreFailure,
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::MalformedQuery => write!(f, "malformed_query"),
            Self::StoreFailure => write!(f, "store_failure"),
        }
    }
}

impl ServiceErrorKind {
    /// Get the error code string for this error kind
    #[must_use]
    pub fn error_code(&self) -> String {
        format!("{}", self).to_uppercase()
    }
}

/// Status attached to not-found errors raised by existence checks
pub const NOT_FOUND_STATUS: u16 = 422;

/// Status attached to malformed query and request errors
pub const MALFORMED_QUERY_STATUS: u16 = 400;

/// Error reported by the user service
///
/// Carries a message and an optional status code. The status is `None` when
/// the underlying fault did not provide one; the transport decides the
/// default in that case.
///
/// # Example
///
/// ```rust
/// use user_service::error::{ServiceError, ServiceErrorKind, ServiceOperation};
///
/// let error = ServiceError::not_found("User", ServiceOperation::FindById);
/// assert_eq!(error.kind, ServiceErrorKind::NotFound);
/// assert_eq!(error.message, "User not found");
/// assert_eq!(error.status, Some(422));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    /// The operation being performed when the error occurred
    pub operation: ServiceOperation,
    /// The category of error
    pub kind: ServiceErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Status code, when one is known
    pub status: Option<u16>,
}

impl ServiceError {
    /// Create a new service error
    pub fn new(
        operation: ServiceOperation,
        kind: ServiceErrorKind,
        message: impl Into<String>,
        status: Option<u16>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            status,
        }
    }

    /// Existence check failed for `entity`
    pub fn not_found(entity: &str, operation: ServiceOperation) -> Self {
        Self::new(
            operation,
            ServiceErrorKind::NotFound,
            format!("{} not found", entity),
            Some(NOT_FOUND_STATUS),
        )
    }

    /// Query normalization or request validation failed
    pub fn malformed_query(operation: ServiceOperation, message: impl Into<String>) -> Self {
        Self::new(
            operation,
            ServiceErrorKind::MalformedQuery,
            message,
            Some(MALFORMED_QUERY_STATUS),
        )
    }

    /// Wrap a store failure, keeping its message and status
    pub fn store_failure(operation: ServiceOperation, err: StoreError) -> Self {
        Self::new(
            operation,
            ServiceErrorKind::StoreFailure,
            err.message,
            err.status,
        )
    }

    /// HTTP status for this error, defaulting to 500 when none was carried
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Service {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(status) = self.status {
            write!(f, " [status: {}]", status)?;
        }
        Ok(())
    }
}

impl std::error::Error for ServiceError {}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.kind.error_code();

        if status.is_server_error() {
            tracing::error!(
                operation = %self.operation,
                kind = %self.kind,
                status = status.as_u16(),
                "Service error: {}", self.message
            );
        } else {
            tracing::warn!(
                operation = %self.operation,
                kind = %self.kind,
                status = status.as_u16(),
                "Service error: {}", self.message
            );
        }

        let body = ErrorResponse::with_code(status, code, self.message);
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Crate Errors
// ============================================================================

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring and running the service
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tracing subscriber could not be installed
    #[error("Tracing error: {0}")]
    Tracing(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Optional error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// HTTP status code
    pub status: u16,
}

impl ErrorResponse {
    /// Create error response with a code
    pub fn with_code(
        status: StatusCode,
        code: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            code: Some(code.into()),
            status: status.as_u16(),
        }
    }
}
