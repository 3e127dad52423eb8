//! Public catalog reads, filtered by the caller's role and grants.

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::debug;

use crate::{
    error::{ApiErrorResponse, ApiResult},
    extract::CurrentPrincipal,
    models::{CategoryListResponse, ProductListResponse, ProductsQuery},
    AppState,
};

/// List the categories visible to the caller
///
/// GET /api/v1/categories
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "Visible categories", body = CategoryListResponse),
        (status = 503, description = "Store unavailable", body = ApiErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> ApiResult<Json<CategoryListResponse>> {
    let categories = state.engine.visible_categories(&principal).await?;
    Ok(Json(CategoryListResponse {
        success: true,
        categories: categories.into_iter().map(Into::into).collect(),
    }))
}

/// List the visible products of one category
///
/// GET /api/v1/products?category_id={id}
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(
        ("category_id" = i64, Query, description = "Category to list")
    ),
    responses(
        (status = 200, description = "Visible products; prices omitted for anonymous callers", body = ProductListResponse),
        (status = 400, description = "Missing or malformed category id", body = ApiErrorResponse),
        (status = 503, description = "Store unavailable", body = ApiErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(query): Query<ProductsQuery>,
) -> ApiResult<Json<ProductListResponse>> {
    let category_id = super::parse_optional_id(query.category_id.as_deref(), "Category ID")?;
    debug!("Listing products for category {:?}", category_id);

    let listing = state.engine.visible_products(&principal, category_id).await?;
    Ok(Json(ProductListResponse {
        success: true,
        products: listing.products.into_iter().map(Into::into).collect(),
        show_price: listing.show_price,
    }))
}
