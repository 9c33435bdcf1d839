//! Error types for Bookworm
//!
//! Every failure a request can hit maps onto one variant, and every variant
//! maps onto exactly one HTTP status.

use hyper::StatusCode;
use serde::Serialize;

/// Main error type for Bookworm operations
#[derive(Debug, thiserror::Error)]
pub enum BookwormError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Expected {expected} answers, got {got}")]
    IncompleteAnswers { expected: usize, got: usize },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Complete the reading quiz for book {0} before reviewing it")]
    NotVerified(i64),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No quiz is configured for book {0}")]
    NoQuizConfigured(i64),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

/// JSON body sent for every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

impl BookwormError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::IncompleteAnswers { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotVerified(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NoQuizConfigured(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Stable machine-readable kind, used as the `code` field of error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::IncompleteAnswers { .. } => "INCOMPLETE_ANSWERS",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotVerified(_) => "NOT_VERIFIED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::NoQuizConfigured(_) => "NO_QUIZ_CONFIGURED",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Auth(_) => "AUTH_ERROR",
        }
    }

    /// Convert to status code and JSON body for an HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, ErrorBody) {
        let status = self.status_code();
        let body = ErrorBody {
            code: self.code(),
            error: self.to_string(),
        };
        (status, body)
    }
}

impl From<std::io::Error> for BookwormError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for BookwormError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<mongodb::error::Error> for BookwormError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for BookwormError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized(format!("JWT error: {}", err))
    }
}

/// Result type alias for Bookworm operations
pub type Result<T> = std::result::Result<T, BookwormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            BookwormError::NotVerified(1).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            BookwormError::IncompleteAnswers { expected: 3, got: 2 }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BookwormError::Unauthorized("no session".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            BookwormError::NotFound("book 9".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_incomplete_answers_is_distinct_from_validation() {
        let incomplete = BookwormError::IncompleteAnswers { expected: 3, got: 2 };
        let validation = BookwormError::Validation("rating".into());
        assert_ne!(incomplete.code(), validation.code());
    }

    #[test]
    fn test_body_carries_code_and_message() {
        let (status, body) = BookwormError::NotVerified(7).into_status_code_and_body();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.code, "NOT_VERIFIED");
        assert!(body.error.contains("book 7"));
    }
}
