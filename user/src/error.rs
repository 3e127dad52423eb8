use authz::AuthzError;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum UserError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Stored role is invalid: {0}")]
    InvalidRole(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Session error: {0}")]
    Session(String),
}

pub type Result<T> = std::result::Result<T, UserError>;

impl From<tower_sessions::session::Error> for UserError {
    fn from(err: tower_sessions::session::Error) -> Self {
        UserError::Session(err.to_string())
    }
}

/// Directory failures in the authorization taxonomy. Bad credentials are
/// reported as `Unauthenticated` so the caller can't tell which half was wrong.
impl From<UserError> for AuthzError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::UserNotFound(what) => AuthzError::NotFound(what),
            UserError::DuplicateUsername => {
                AuthzError::Conflict("Username already exists".to_string())
            }
            UserError::InvalidCredentials => AuthzError::Unauthenticated,
            UserError::Validation(msg) => AuthzError::InvalidArgument(msg),
            UserError::Database(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                error!("Unique constraint violated: {}", db_err);
                AuthzError::Conflict("Resource already exists".to_string())
            }
            other => {
                error!("User directory failure: {}", other);
                AuthzError::Unavailable(other.to_string())
            }
        }
    }
}
