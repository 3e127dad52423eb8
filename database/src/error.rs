use authz::AuthzError;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Translates storage failures into the authorization taxonomy.
///
/// Constraint and driver messages are logged here and replaced by generic
/// text; only validation and not-found messages written by this crate pass
/// through verbatim.
impl From<DatabaseError> for AuthzError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Connection(sqlx::Error::RowNotFound) => {
                AuthzError::NotFound("Resource not found".to_string())
            }
            DatabaseError::Connection(sqlx::Error::Database(db_err))
                if db_err.is_unique_violation() =>
            {
                error!("Unique constraint violated: {}", db_err);
                AuthzError::Conflict("Resource already exists".to_string())
            }
            DatabaseError::Connection(sqlx::Error::Database(db_err))
                if db_err.is_foreign_key_violation() || db_err.is_check_violation() =>
            {
                error!("Constraint violated: {}", db_err);
                AuthzError::Conflict("Operation conflicts with existing data".to_string())
            }
            DatabaseError::EntityNotFound(what) => AuthzError::NotFound(what),
            DatabaseError::Validation(msg) => AuthzError::InvalidArgument(msg),
            other => {
                error!("Store failure: {}", other);
                AuthzError::Unavailable(other.to_string())
            }
        }
    }
}
