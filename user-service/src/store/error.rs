//! Store error types
//!
//! Structured errors raised by [`DocumentStore`](super::DocumentStore)
//! backends. A store error carries the operation that failed, a category and
//! an optional status code supplied by the driver.
//!
//! # Example
//!
//! ```rust
//! use user_service::store::{StoreError, StoreErrorKind, StoreOperation};
//!
//! let error = StoreError::connection_failed(StoreOperation::Count, "socket closed");
//! assert_eq!(error.kind, StoreErrorKind::ConnectionFailed);
//! ```

use std::fmt;

/// Operation being performed when the store error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// Filtered, sorted and windowed document fetch
    Find,
    /// Single document lookup by identifier
    FindById,
    /// Document count, with or without a filter
    Count,
    /// Inserting a new document
    Insert,
    /// Atomic find-and-update of a single document
    FindOneAndUpdate,
    /// Deleting a single document
    DeleteOne,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Find => write!(f, "find"),
            Self::FindById => write!(f, "find_by_id"),
            Self::Count => write!(f, "count"),
            Self::Insert => write!(f, "insert"),
            Self::FindOneAndUpdate => write!(f, "find_one_and_update"),
            Self::DeleteOne => write!(f, "delete_one"),
        }
    }
}

/// Category of store error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// Failed to reach the store
    ConnectionFailed,
    /// The store rejected the document (duplicate key, schema violation)
    ConstraintViolation,
    /// Document could not be encoded or decoded
    SerializationError,
    /// Any other driver failure
    Other,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::ConstraintViolation => write!(f, "constraint_violation"),
            Self::SerializationError => write!(f, "serialization_error"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured store error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    /// The operation being performed when the error occurred
    pub operation: StoreOperation,
    /// The category of error
    pub kind: StoreErrorKind,
    /// Message reported by the driver
    pub message: String,
    /// Status code attached by the driver, if any
    pub status: Option<u16>,
}

impl StoreError {
    /// Create a new store error without a status code
    pub fn new(operation: StoreOperation, kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Create a connection failed error
    pub fn connection_failed(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::ConnectionFailed, message)
    }

    /// Create a constraint violation error
    pub fn constraint_violation(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::ConstraintViolation, message)
    }

    /// Create a serialization error
    pub fn serialization_error(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::SerializationError, message)
    }

    /// Attach a status code reported by the driver
    ///
    /// # Example
    ///
    /// ```rust
    /// use user_service::store::{StoreError, StoreOperation};
    ///
    /// let error = StoreError::constraint_violation(StoreOperation::Insert, "duplicate email")
    ///     .with_status(409);
    /// assert_eq!(error.status, Some(409));
    /// ```
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Store {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(status) = self.status {
            write!(f, " [status: {}]", status)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_operation_display() {
        assert_eq!(format!("{}", StoreOperation::Find), "find");
        assert_eq!(format!("{}", StoreOperation::FindById), "find_by_id");
        assert_eq!(format!("{}", StoreOperation::Count), "count");
        assert_eq!(format!("{}", StoreOperation::Insert), "insert");
        assert_eq!(
            format!("{}", StoreOperation::FindOneAndUpdate),
            "find_one_and_update"
        );
        assert_eq!(format!("{}", StoreOperation::DeleteOne), "delete_one");
    }

    #[test]
    fn test_new_has_no_status() {
        let error = StoreError::new(StoreOperation::Find, StoreErrorKind::Other, "boom");
        assert_eq!(error.message, "boom");
        assert!(error.status.is_none());
    }

    #[test]
    fn test_with_status() {
        let error = StoreError::connection_failed(StoreOperation::Count, "slow").with_status(504);
        assert_eq!(error.kind, StoreErrorKind::ConnectionFailed);
        assert_eq!(error.status, Some(504));
    }

    #[test]
    fn test_serialization_error_keeps_operation() {
        let error =
            StoreError::serialization_error(StoreOperation::FindOneAndUpdate, "bad json");
        assert_eq!(error.kind, StoreErrorKind::SerializationError);
        assert_eq!(
            error.to_string(),
            "Store serialization_error error during find_one_and_update: bad json"
        );
    }

    #[test]
    fn test_display_without_status() {
        let error = StoreError::connection_failed(StoreOperation::Count, "refused");
        let display = error.to_string();
        assert_eq!(display, "Store connection_failed error during count: refused");
    }

    #[test]
    fn test_display_with_status() {
        let error = StoreError::constraint_violation(StoreOperation::Insert, "dup").with_status(409);
        assert!(error.to_string().ends_with("[status: 409]"));
    }
}
