//! Error types for the authorization system.
//!
//! # Security Note
//! Store failures carry their raw detail so it can be logged, but that detail
//! never crosses the process boundary in production. `public_message()` is
//! the only text meant for callers.

use thiserror::Error;

/// Errors surfaced by the authorization engine and permission resolver.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// A required field is missing or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No principal is attached to the request.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// The principal is authenticated but its role is insufficient.
    #[error("Forbidden")]
    Forbidden,

    /// A referenced category, product or principal does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation would violate a uniqueness or atomicity invariant.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backing store could not be reached or failed mid-operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl AuthzError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AuthzError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AuthzError::Unauthenticated => "UNAUTHENTICATED",
            AuthzError::Forbidden => "FORBIDDEN",
            AuthzError::NotFound(_) => "NOT_FOUND",
            AuthzError::Conflict(_) => "CONFLICT",
            AuthzError::Unavailable(_) => "UNAVAILABLE",
        }
    }

    /// Message safe to show to any caller.
    pub fn public_message(&self) -> String {
        match self {
            AuthzError::InvalidArgument(msg) => msg.clone(),
            AuthzError::Unauthenticated => "Unauthorized. Please login.".to_string(),
            AuthzError::Forbidden => "Forbidden. Super admin access required.".to_string(),
            AuthzError::NotFound(msg) => msg.clone(),
            AuthzError::Conflict(msg) => msg.clone(),
            AuthzError::Unavailable(_) => "Service temporarily unavailable".to_string(),
        }
    }
}

/// A specialized Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthzError::InvalidArgument("Category ID is required".into());
        assert_eq!(err.to_string(), "Invalid argument: Category ID is required");
        assert_eq!(AuthzError::Forbidden.to_string(), "Forbidden");
    }

    #[test]
    fn test_unavailable_detail_stays_internal() {
        let err = AuthzError::Unavailable("disk I/O error at page 12".into());
        assert!(err.to_string().contains("disk I/O error"));
        assert!(!err.public_message().contains("disk"));
        assert_eq!(err.code(), "UNAVAILABLE");
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            AuthzError::InvalidArgument("x".into()),
            AuthzError::Unauthenticated,
            AuthzError::Forbidden,
            AuthzError::NotFound("x".into()),
            AuthzError::Conflict("x".into()),
            AuthzError::Unavailable("x".into()),
        ];
        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }
}
