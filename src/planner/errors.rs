//! Query error types
//!
//! Error codes:
//! - QUERY_UNKNOWN_PROPERTY (REJECT)
//! - QUERY_INVALID_FILTER_PROPERTY (REJECT)
//! - QUERY_INVALID_ORDER_PROPERTY (REJECT)
//! - QUERY_EMPTY_SELECTION (REJECT)
//! - QUERY_SHAPE_CONSTRUCTION_FAILED (FATAL)
//! - QUERY_STORAGE_FAILED (ERROR)
//!
//! Everything except storage failures is detected before storage is touched.

use std::fmt;

use thiserror::Error;

use crate::executor::StorageError;

/// Severity levels for query errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
    /// Operation failed but the engine is healthy
    Error,
    /// Internal invariant violated
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Errors produced while compiling or executing a query
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// Name not resolvable on the entity type (missing or ambiguous)
    #[error("Unknown property '{0}'")]
    UnknownProperty(String),

    /// Operator or literal incompatible with the property's type
    #[error("Invalid filter on property '{property}': {reason}")]
    InvalidFilterProperty { property: String, reason: String },

    /// Property cannot be used as an ordering key
    #[error("Property '{0}' cannot be used for ordering")]
    InvalidOrderProperty(String),

    /// Select or expand resolved to zero columns
    #[error("Select or expand clause is empty")]
    EmptySelection,

    /// Internal defect while building or publishing a projection shape
    #[error("Shape construction failed: {0}")]
    ShapeConstructionFailure(String),

    /// Storage collaborator failure, propagated unchanged
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl QueryError {
    pub(crate) fn invalid_filter(property: impl Into<String>, reason: impl Into<String>) -> Self {
        QueryError::InvalidFilterProperty {
            property: property.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::UnknownProperty(_) => "QUERY_UNKNOWN_PROPERTY",
            QueryError::InvalidFilterProperty { .. } => "QUERY_INVALID_FILTER_PROPERTY",
            QueryError::InvalidOrderProperty(_) => "QUERY_INVALID_ORDER_PROPERTY",
            QueryError::EmptySelection => "QUERY_EMPTY_SELECTION",
            QueryError::ShapeConstructionFailure(_) => "QUERY_SHAPE_CONSTRUCTION_FAILED",
            QueryError::Storage(_) => "QUERY_STORAGE_FAILED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            QueryError::ShapeConstructionFailure(_) => Severity::Fatal,
            QueryError::Storage(_) => Severity::Error,
            _ => Severity::Reject,
        }
    }

    /// Returns true if the caller sent a query the engine cannot answer
    pub fn is_client_error(&self) -> bool {
        self.severity() == Severity::Reject
    }

    /// Returns true if the request was abandoned
    pub fn is_cancelled(&self) -> bool {
        matches!(self, QueryError::Storage(StorageError::Cancelled))
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
