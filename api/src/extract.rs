use authz::{AuthzError, Principal};
use axum::{extract::FromRequestParts, http::request::Parts, Extension};
use tower_sessions::Session;
use tracing::error;

use crate::{error::ApiError, AppState};

/// The principal of the current request, resolved from its session.
///
/// Requests without a logged-in session get `Principal::anonymous()`; the
/// role checks are left to the handler.
pub struct CurrentPrincipal(pub Principal);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Extension(session) = Extension::<Session>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                error!("Session extension missing: {}", e);
                AuthzError::Unavailable("session layer is not installed".to_string())
            })?;

        let principal =
            user::SessionManager::current_principal(&session, &state.directory).await?;
        Ok(CurrentPrincipal(principal))
    }
}
