//! Account management. Super only.

use authz::{gate::require_super, AuthzError, Role};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use tracing::info;
use user::{NewUser, UserUpdate};

use crate::{
    error::{ApiErrorResponse, ApiResult},
    extract::CurrentPrincipal,
    models::{
        CreateUserRequest, SuccessResponse, UpdateUserRequest, UserListResponse, UserResponse,
    },
    AppState,
};

fn parse_role(raw: Option<&str>) -> Result<Option<Role>, AuthzError> {
    raw.map(|r| r.trim().to_ascii_lowercase().parse()).transpose()
}

/// List accounts, newest first
///
/// GET /api/v1/users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "All accounts", body = UserListResponse),
        (status = 401, description = "Not logged in", body = ApiErrorResponse),
        (status = 403, description = "Caller is not a super admin", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> ApiResult<Json<UserListResponse>> {
    require_super(&principal)?;
    let users = state.directory.list_users().await?;
    Ok(Json(UserListResponse {
        success: true,
        users: users.into_iter().map(Into::into).collect(),
    }))
}

/// Create an account
///
/// POST /api/v1/users
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Missing fields or unknown role", body = ApiErrorResponse),
        (status = 403, description = "Caller is not a super admin", body = ApiErrorResponse),
        (status = 409, description = "Username already exists", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    require_super(&principal)?;
    let Json(request) = payload?;
    let role = parse_role(request.role.as_deref())?.unwrap_or(Role::Admin);

    let record = state
        .directory
        .create_user(NewUser {
            name: request.name,
            username: request.username,
            email: request.email,
            password: request.password,
            role,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            success: true,
            user: record.into(),
        }),
    ))
}

/// Read one account
///
/// GET /api/v1/users/{id}
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "The account", body = UserResponse),
        (status = 404, description = "No such user", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<UserResponse>> {
    require_super(&principal)?;
    let Path(id) = id?;
    let record = state.directory.get_user(id).await?;
    Ok(Json(UserResponse {
        success: true,
        user: record.into(),
    }))
}

/// Update an account
///
/// PUT /api/v1/users/{id}
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated account", body = UserResponse),
        (status = 400, description = "Nothing to update or unknown role", body = ApiErrorResponse),
        (status = 404, description = "No such user", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    require_super(&principal)?;
    let Path(id) = id?;
    let Json(request) = payload?;

    let record = state
        .directory
        .update_user(
            id,
            UserUpdate {
                name: request.name,
                email: request.email,
                password: request.password,
                role: parse_role(request.role.as_deref())?,
            },
        )
        .await?;

    Ok(Json(UserResponse {
        success: true,
        user: record.into(),
    }))
}

/// Delete an account. A super admin can't delete itself.
///
/// DELETE /api/v1/users/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Account deleted", body = SuccessResponse),
        (status = 400, description = "Attempt to delete own account", body = ApiErrorResponse),
        (status = 404, description = "No such user", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<SuccessResponse>> {
    let caller = require_super(&principal)?;
    let Path(id) = id?;
    if id == caller {
        return Err(AuthzError::InvalidArgument("Cannot delete your own account".to_string()).into());
    }

    state.directory.delete_user(id).await?;
    info!("User {} deleted by {}", id, caller);
    Ok(Json(SuccessResponse::new("User deleted successfully")))
}
