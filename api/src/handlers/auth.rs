//! Login, logout, signup and the caller's own session view.

use authz::{AuthzError, Role};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use tower_sessions::Session;
use tracing::info;
use user::{NewUser, SessionManager};

use crate::{
    error::{ApiError, ApiErrorResponse, ApiResult},
    extract::CurrentPrincipal,
    models::{
        AccessScopeResponse, LoginRequest, LoginResponse, SessionResponse, SignupRequest,
        SuccessResponse,
    },
    AppState,
};

/// Log in with username and password
///
/// POST /api/v1/auth/login
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = LoginResponse),
        (status = 400, description = "Missing username or password", body = ApiErrorResponse),
        (status = 401, description = "Invalid username or password", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(request) = payload?;
    if request.username.trim().is_empty() || request.password.trim().is_empty() {
        return Err(AuthzError::InvalidArgument(
            "Username and password cannot be empty".to_string(),
        )
        .into());
    }

    let record = state
        .directory
        .authenticate(&request.username, &request.password)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    SessionManager::establish(&session, &record).await?;
    info!("User {} logged in as {}", record.id, record.role);

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        user: record.into(),
    }))
}

/// End the current session
///
/// POST /api/v1/auth/logout
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = SuccessResponse)
    ),
    tag = "auth"
)]
pub async fn logout(Extension(session): Extension<Session>) -> ApiResult<Json<SuccessResponse>> {
    SessionManager::destroy(&session).await?;
    Ok(Json(SuccessResponse::new("Logged out successfully")))
}

/// Create an admin account
///
/// POST /api/v1/auth/signup
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = SuccessResponse),
        (status = 400, description = "Missing fields", body = ApiErrorResponse),
        (status = 409, description = "Username already exists", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SuccessResponse>)> {
    let Json(request) = payload?;

    let record = state
        .directory
        .create_user(NewUser {
            name: request.name,
            username: request.username,
            email: request.email,
            password: request.password,
            role: Role::Admin,
        })
        .await?;
    info!("Signup created account {}", record.id);

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(
            "Account created successfully. Please login.",
        )),
    ))
}

/// Who is logged in, if anyone
///
/// GET /api/v1/auth/session
#[utoipa::path(
    get,
    path = "/api/v1/auth/session",
    responses(
        (status = 200, description = "Session state", body = SessionResponse)
    ),
    tag = "auth"
)]
pub async fn session_info(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<SessionResponse>> {
    let user = SessionManager::current_user(&session, &state.directory).await?;
    Ok(Json(SessionResponse {
        success: true,
        logged_in: user.is_some(),
        user: user.map(Into::into),
    }))
}

/// The caller's own access
///
/// GET /api/v1/auth/permissions
#[utoipa::path(
    get,
    path = "/api/v1/auth/permissions",
    responses(
        (status = 200, description = "All access for super admins, granted ids for admins", body = AccessScopeResponse),
        (status = 401, description = "Not logged in", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn my_permissions(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> ApiResult<Json<AccessScopeResponse>> {
    let scope = state.engine.access_scope(&principal).await?;
    Ok(Json(scope.into()))
}
