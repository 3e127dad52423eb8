use authz::{AccessScope, Category, GrantSet, GrantSummary, Product, ProductView};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use user::UserRecord;
use utoipa::ToSchema;

/// A catalog category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryBody {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl From<Category> for CategoryBody {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
        }
    }
}

/// A catalog product. `price` is absent when the caller may not see it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductBody {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub image: Option<String>,
    pub sku: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl From<ProductView> for ProductBody {
    fn from(view: ProductView) -> Self {
        Self {
            id: view.id,
            name: view.name,
            category_id: view.category_id,
            image: view.image,
            sku: view.sku,
            description: view.description,
            price: view.price,
        }
    }
}

/// Management views always carry the price.
impl From<Product> for ProductBody {
    fn from(product: Product) -> Self {
        ProductView::from_product(product, true).into()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryListResponse {
    pub success: bool,
    pub categories: Vec<CategoryBody>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<ProductBody>,
    pub show_price: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub success: bool,
    pub message: String,
    pub category: CategoryBody,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub success: bool,
    pub message: String,
    pub product: ProductBody,
}

/// Query for `GET /products`. Kept as text so a malformed id is reported
/// in the error envelope.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub category_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PermissionsQuery {
    pub user_id: Option<String>,
}

/// A principal's grants split by kind
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionsResponse {
    pub success: bool,
    pub categories: Vec<i64>,
    pub products: Vec<i64>,
}

impl From<GrantSet> for PermissionsResponse {
    fn from(set: GrantSet) -> Self {
        Self {
            success: true,
            categories: set.categories.into_iter().collect(),
            products: set.products.into_iter().collect(),
        }
    }
}

/// Replace every grant of `user_id`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReplacePermissionsRequest {
    pub user_id: i64,
    #[serde(default)]
    pub categories: Vec<i64>,
    #[serde(default)]
    pub products: Vec<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct GrantSummaryBody {
    pub categories_granted: usize,
    pub products_granted: usize,
}

impl From<GrantSummary> for GrantSummaryBody {
    fn from(summary: GrantSummary) -> Self {
        Self {
            categories_granted: summary.categories_granted,
            products_granted: summary.products_granted,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReplacePermissionsResponse {
    pub success: bool,
    pub message: String,
    pub summary: GrantSummaryBody,
}

/// The caller's own access, as returned by `GET /auth/permissions`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessScopeResponse {
    pub success: bool,
    pub role: String,
    pub all_access: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<i64>>,
}

impl From<AccessScope> for AccessScopeResponse {
    fn from(scope: AccessScope) -> Self {
        match scope {
            AccessScope::All => Self {
                success: true,
                role: "super".to_string(),
                all_access: true,
                categories: None,
                products: None,
            },
            AccessScope::Scoped(set) => Self {
                success: true,
                role: "admin".to_string(),
                all_access: false,
                categories: Some(set.categories.into_iter().collect()),
                products: Some(set.products.into_iter().collect()),
            },
        }
    }
}

/// A stored account, without credentials
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserBody {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: String,
    #[schema(value_type = String)]
    pub created_at: NaiveDateTime,
}

impl From<UserRecord> for UserBody {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            username: record.username,
            email: record.email,
            role: record.role.to_string(),
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub user: UserBody,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub success: bool,
    pub logged_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserBody>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// `admin` (default) or `super`
    pub role: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub success: bool,
    pub user: UserBody,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserListResponse {
    pub success: bool,
    pub users: Vec<UserBody>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CategoryUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductRequest {
    #[serde(default)]
    pub name: String,
    pub category_id: i64,
    pub image: Option<String>,
    #[serde(default)]
    pub sku: String,
    pub description: Option<String>,
    pub price: f64,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ProductUpdateRequest {
    pub name: Option<String>,
    pub category_id: Option<i64>,
    pub image: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
}

impl From<CategoryRequest> for database::NewCategory {
    fn from(req: CategoryRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

impl From<CategoryUpdateRequest> for database::CategoryUpdate {
    fn from(req: CategoryUpdateRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

impl From<ProductRequest> for database::NewProduct {
    fn from(req: ProductRequest) -> Self {
        Self {
            name: req.name,
            category_id: req.category_id,
            image: req.image,
            sku: req.sku,
            description: req.description,
            price: req.price,
        }
    }
}

impl From<ProductUpdateRequest> for database::ProductUpdate {
    fn from(req: ProductUpdateRequest) -> Self {
        Self {
            name: req.name,
            category_id: req.category_id,
            image: req.image,
            sku: req.sku,
            description: req.description,
            price: req.price,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[schema(value_type = String)]
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub message: String,
}

/// Generic success response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
