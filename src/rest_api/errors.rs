//! # REST API Errors
//!
//! Error types for the HTTP boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::planner::{QueryError, Severity};

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

/// REST API errors
#[derive(Debug, Clone, Error)]
pub enum RestError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Invalid query parameter
    #[error("Invalid query parameter: {0}")]
    InvalidQueryParam(String),

    /// Invalid filter expression
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Invalid order expression
    #[error("Invalid orderby: {0}")]
    InvalidOrder(String),

    /// Limit exceeds maximum
    #[error("Top {0} exceeds maximum {1}")]
    LimitExceeded(usize, usize),

    /// Invalid path segment
    #[error("Invalid path parameter: {0}")]
    InvalidPathParam(String),

    /// Collection not found
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// No row with this id
    #[error("{collection} {id} not found")]
    EntityNotFound { collection: String, id: i64 },

    // ==================
    // Engine Errors
    // ==================
    /// Query compilation or storage failure
    #[error(transparent)]
    Query(#[from] QueryError),

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Internal error outside the engine
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RestError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            RestError::InvalidQueryParam(_)
            | RestError::InvalidFilter(_)
            | RestError::InvalidOrder(_)
            | RestError::InvalidPathParam(_)
            | RestError::LimitExceeded(_, _) => StatusCode::BAD_REQUEST,

            // 404 Not Found
            RestError::CollectionNotFound(_) | RestError::EntityNotFound { .. } => {
                StatusCode::NOT_FOUND
            }

            RestError::Query(err) => match err.severity() {
                Severity::Reject => StatusCode::BAD_REQUEST,
                Severity::Error => StatusCode::SERVICE_UNAVAILABLE,
                Severity::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
            },

            // 500 Internal Server Error
            RestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            RestError::InvalidQueryParam(_) => "REST_INVALID_QUERY_PARAM",
            RestError::InvalidFilter(_) => "REST_INVALID_FILTER",
            RestError::InvalidOrder(_) => "REST_INVALID_ORDER",
            RestError::LimitExceeded(_, _) => "REST_LIMIT_EXCEEDED",
            RestError::InvalidPathParam(_) => "REST_INVALID_PATH_PARAM",
            RestError::CollectionNotFound(_) => "REST_COLLECTION_NOT_FOUND",
            RestError::EntityNotFound { .. } => "REST_ENTITY_NOT_FOUND",
            RestError::Query(err) => err.code(),
            RestError::Internal(_) => "REST_INTERNAL_ERROR",
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    pub status: u16,
}

impl From<RestError> for ErrorResponse {
    fn from(err: RestError) -> Self {
        Self {
            status: err.status_code().as_u16(),
            code: err.code(),
            error: err.to_string(),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::from(self));
        (status, body).into_response()
    }
}
