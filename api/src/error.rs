use authz::AuthzError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// API Error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Authz(#[from] AuthzError),

    /// Failed login. Reported as unauthenticated with its own message.
    #[error("Invalid username or password")]
    InvalidCredentials,
}

/// Error envelope returned for every failed request
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub code: String,
    pub message: String,
}

/// The envelope with internal detail, carried as a response extension.
/// Only `middleware_hooks::error_detail_middleware` of a non-production
/// router puts it in the body; otherwise it never leaves the process.
#[derive(Debug, Clone)]
pub struct DetailedError(pub ApiErrorResponse);

impl ApiError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Authz(err) => match err {
                AuthzError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                AuthzError::Unauthenticated => StatusCode::UNAUTHORIZED,
                AuthzError::Forbidden => StatusCode::FORBIDDEN,
                AuthzError::NotFound(_) => StatusCode::NOT_FOUND,
                AuthzError::Conflict(_) => StatusCode::CONFLICT,
                AuthzError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        }
    }

    /// Get error code for the error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Authz(err) => err.code(),
            ApiError::InvalidCredentials => "UNAUTHENTICATED",
        }
    }

    /// The message sent to the client.
    pub fn client_message(&self, expose_details: bool) -> String {
        match self {
            ApiError::Authz(AuthzError::Unavailable(detail)) if expose_details => {
                format!("Service temporarily unavailable ({})", detail)
            }
            ApiError::Authz(err) => err.public_message(),
            ApiError::InvalidCredentials => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected ({}): {}", status.as_u16(), self);
        }

        let public = self.client_message(false);
        let detailed = self.client_message(true);
        let body = ApiErrorResponse {
            success: false,
            code: self.error_code().to_string(),
            message: public,
        };

        let mut response = (status, Json(body.clone())).into_response();
        if detailed != body.message {
            response.extensions_mut().insert(DetailedError(ApiErrorResponse {
                message: detailed,
                ..body
            }));
        }
        response
    }
}

impl From<database::DatabaseError> for ApiError {
    fn from(err: database::DatabaseError) -> Self {
        ApiError::Authz(err.into())
    }
}

impl From<user::UserError> for ApiError {
    fn from(err: user::UserError) -> Self {
        ApiError::Authz(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Authz(AuthzError::InvalidArgument(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Authz(AuthzError::InvalidArgument(rejection.body_text()))
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
