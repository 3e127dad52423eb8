//! Grant administration. Super only.

use authz::{gate::require_super, AuthzError};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use tracing::info;

use crate::{
    error::{ApiErrorResponse, ApiResult},
    extract::CurrentPrincipal,
    models::{
        PermissionsQuery, PermissionsResponse, ReplacePermissionsRequest,
        ReplacePermissionsResponse,
    },
    AppState,
};

/// Read a user's grants, split by kind
///
/// GET /api/v1/permissions?user_id={id}
#[utoipa::path(
    get,
    path = "/api/v1/permissions",
    params(
        ("user_id" = i64, Query, description = "User whose grants to read")
    ),
    responses(
        (status = 200, description = "Granted category and product ids", body = PermissionsResponse),
        (status = 400, description = "Missing or malformed user id", body = ApiErrorResponse),
        (status = 401, description = "Not logged in", body = ApiErrorResponse),
        (status = 403, description = "Caller is not a super admin", body = ApiErrorResponse)
    ),
    tag = "permissions"
)]
pub async fn get_permissions(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(query): Query<PermissionsQuery>,
) -> ApiResult<Json<PermissionsResponse>> {
    require_super(&principal)?;
    let user_id = super::parse_optional_id(query.user_id.as_deref(), "User ID")?
        .ok_or_else(|| AuthzError::InvalidArgument("User ID is required".to_string()))?;

    let set = state.engine.grant_set(&principal, user_id).await?;
    Ok(Json(set.into()))
}

/// Replace a user's grants in one transaction
///
/// POST /api/v1/permissions
#[utoipa::path(
    post,
    path = "/api/v1/permissions",
    request_body = ReplacePermissionsRequest,
    responses(
        (status = 200, description = "Grants replaced", body = ReplacePermissionsResponse),
        (status = 400, description = "Invalid request", body = ApiErrorResponse),
        (status = 401, description = "Not logged in", body = ApiErrorResponse),
        (status = 403, description = "Caller is not a super admin", body = ApiErrorResponse),
        (status = 404, description = "Target user does not exist", body = ApiErrorResponse),
        (status = 503, description = "Store unavailable; previous grants kept", body = ApiErrorResponse)
    ),
    tag = "permissions"
)]
pub async fn replace_permissions(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    payload: Result<Json<ReplacePermissionsRequest>, JsonRejection>,
) -> ApiResult<Json<ReplacePermissionsResponse>> {
    require_super(&principal)?;
    let Json(request) = payload?;

    if request.user_id > 0 && state.directory.lookup(request.user_id).await?.is_none() {
        return Err(AuthzError::NotFound("User not found".to_string()).into());
    }

    let summary = state
        .resolver
        .replace_grants(
            &principal,
            request.user_id,
            &request.categories,
            &request.products,
        )
        .await?;

    info!(
        "Permissions of user {} replaced by {:?}",
        request.user_id,
        principal.id()
    );
    Ok(Json(ReplacePermissionsResponse {
        success: true,
        message: "Permissions updated successfully".to_string(),
        summary: summary.into(),
    }))
}
