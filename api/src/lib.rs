use authz::{AuthzEngine, PermissionResolver};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use database::Database;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use user::{MemoryStore, UserDirectory};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware_hooks;
pub mod models;
pub mod server;

// Re-export server functions for convenience
pub use server::{
    spawn_server_with_config, start_server, start_server_with_config, ApiConfig, Environment,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub engine: AuthzEngine,
    pub resolver: PermissionResolver,
    pub directory: UserDirectory,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Wire the engines and the account directory over one database. The
    /// directory shares the catalog's pool and brings its own table.
    pub async fn new(db: Arc<Database>, config: ApiConfig) -> user::UserResult<Self> {
        let directory = UserDirectory::new(db.get_pool()).await?;
        Ok(Self {
            engine: AuthzEngine::new(db.clone()),
            resolver: PermissionResolver::new(db.clone()),
            directory,
            db,
            config: Arc::new(config),
        })
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::catalog::list_categories,
        handlers::catalog::list_products,
        handlers::permissions::get_permissions,
        handlers::permissions::replace_permissions,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::signup,
        handlers::auth::session_info,
        handlers::auth::my_permissions,
        handlers::manage::list_categories,
        handlers::manage::create_category,
        handlers::manage::get_category,
        handlers::manage::update_category,
        handlers::manage::delete_category,
        handlers::manage::list_products,
        handlers::manage::create_product,
        handlers::manage::get_product,
        handlers::manage::update_product,
        handlers::manage::delete_product,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::CategoryBody,
            models::ProductBody,
            models::CategoryListResponse,
            models::ProductListResponse,
            models::CategoryResponse,
            models::ProductResponse,
            models::PermissionsResponse,
            models::ReplacePermissionsRequest,
            models::ReplacePermissionsResponse,
            models::GrantSummaryBody,
            models::AccessScopeResponse,
            models::UserBody,
            models::LoginRequest,
            models::LoginResponse,
            models::SignupRequest,
            models::SessionResponse,
            models::CreateUserRequest,
            models::UpdateUserRequest,
            models::UserResponse,
            models::UserListResponse,
            models::CategoryRequest,
            models::CategoryUpdateRequest,
            models::ProductRequest,
            models::ProductUpdateRequest,
            models::HealthResponse,
            models::DatabaseHealth,
            models::SuccessResponse,
            handlers::manage::ManagedProductsResponse,
            error::ApiErrorResponse,
        )
    ),
    tags(
        (name = "catalog", description = "Role-filtered catalog reads"),
        (name = "permissions", description = "Grant inspection and replacement"),
        (name = "auth", description = "Login and session"),
        (name = "manage", description = "Catalog management"),
        (name = "users", description = "Account management"),
        (name = "health", description = "Health check endpoints"),
    ),
    info(
        title = "Showcase Catalog API",
        version = "1.0.0",
        description = "Product catalog with per-user category and product grants",
    ),
)]
pub struct ApiDoc;

/// Create the main API router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let expose_details = !state.config.environment.is_production();

    let api_v1 = Router::new()
        // Public catalog
        .route("/categories", get(handlers::catalog::list_categories))
        .route("/products", get(handlers::catalog::list_products))
        // Grants
        .route(
            "/permissions",
            get(handlers::permissions::get_permissions)
                .post(handlers::permissions::replace_permissions),
        )
        // Session
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/session", get(handlers::auth::session_info))
        .route("/auth/permissions", get(handlers::auth::my_permissions))
        // Catalog management
        .route(
            "/manage/categories",
            get(handlers::manage::list_categories).post(handlers::manage::create_category),
        )
        .route(
            "/manage/categories/:id",
            get(handlers::manage::get_category)
                .put(handlers::manage::update_category)
                .delete(handlers::manage::delete_category),
        )
        .route(
            "/manage/products",
            get(handlers::manage::list_products).post(handlers::manage::create_product),
        )
        .route(
            "/manage/products/:id",
            get(handlers::manage::get_product)
                .put(handlers::manage::update_product)
                .delete(handlers::manage::delete_product),
        )
        // Accounts
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/:id",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        // Health check
        .route("/health", get(handlers::health::health_check))
        .layer(middleware::from_fn_with_state(
            expose_details,
            middleware_hooks::error_detail_middleware,
        ))
        .layer(middleware::from_fn(middleware_hooks::request_middleware))
        .layer(middleware::from_fn(middleware_hooks::response_middleware))
        .layer(state.config.session.layer(MemoryStore::default()));

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(SwaggerUi::new("/api/v1/swagger").url("/api/v1/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
