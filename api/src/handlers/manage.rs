//! Category and product management for logged-in administrators.

use authz::gate::require_catalog_writer;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use std::path::Path as FsPath;
use tracing::{info, warn};

use crate::{
    error::{ApiErrorResponse, ApiResult},
    extract::CurrentPrincipal,
    models::{
        CategoryBody, CategoryListResponse, CategoryRequest, CategoryResponse,
        CategoryUpdateRequest, ProductBody, ProductRequest, ProductResponse,
        ProductUpdateRequest, SuccessResponse,
    },
    AppState,
};

/// Every product regardless of grants, with prices.
#[derive(Debug, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct ManagedProductsResponse {
    pub success: bool,
    pub products: Vec<ProductBody>,
}

#[utoipa::path(
    get,
    path = "/api/v1/manage/categories",
    responses(
        (status = 200, description = "All categories", body = CategoryListResponse),
        (status = 401, description = "Not logged in", body = ApiErrorResponse)
    ),
    tag = "manage"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> ApiResult<Json<CategoryListResponse>> {
    require_catalog_writer(&principal)?;
    let categories = state.db.all_categories().await?;
    Ok(Json(CategoryListResponse {
        success: true,
        categories: categories.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/manage/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Name is blank", body = ApiErrorResponse),
        (status = 401, description = "Not logged in", body = ApiErrorResponse)
    ),
    tag = "manage"
)]
pub async fn create_category(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CategoryResponse>)> {
    require_catalog_writer(&principal)?;
    let Json(request) = payload?;
    let category = state.db.create_category(request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse {
            success: true,
            message: "Category created successfully".to_string(),
            category: category.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/manage/categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "The category", body = CategoryBody),
        (status = 404, description = "No such category", body = ApiErrorResponse)
    ),
    tag = "manage"
)]
pub async fn get_category(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<CategoryBody>> {
    require_catalog_writer(&principal)?;
    let Path(id) = id?;
    Ok(Json(state.db.get_category(id).await?.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/manage/categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    request_body = CategoryUpdateRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "No fields to update", body = ApiErrorResponse),
        (status = 404, description = "No such category", body = ApiErrorResponse)
    ),
    tag = "manage"
)]
pub async fn update_category(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CategoryUpdateRequest>, JsonRejection>,
) -> ApiResult<Json<CategoryResponse>> {
    require_catalog_writer(&principal)?;
    let Path(id) = id?;
    let Json(request) = payload?;
    let category = state.db.update_category(id, request.into()).await?;
    Ok(Json(CategoryResponse {
        success: true,
        message: "Category updated successfully".to_string(),
        category: category.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/manage/categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted", body = SuccessResponse),
        (status = 404, description = "No such category", body = ApiErrorResponse)
    ),
    tag = "manage"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<SuccessResponse>> {
    require_catalog_writer(&principal)?;
    let Path(id) = id?;
    state.db.delete_category(id).await?;
    Ok(Json(SuccessResponse::new("Category deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/v1/manage/products",
    responses(
        (status = 200, description = "All products with prices", body = ManagedProductsResponse),
        (status = 401, description = "Not logged in", body = ApiErrorResponse)
    ),
    tag = "manage"
)]
pub async fn list_products(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> ApiResult<Json<ManagedProductsResponse>> {
    require_catalog_writer(&principal)?;
    let products = state.db.all_products().await?;
    Ok(Json(ManagedProductsResponse {
        success: true,
        products: products.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/manage/products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Missing name or sku, or non-positive price", body = ApiErrorResponse),
        (status = 404, description = "Category does not exist", body = ApiErrorResponse)
    ),
    tag = "manage"
)]
pub async fn create_product(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProductResponse>)> {
    require_catalog_writer(&principal)?;
    let Json(request) = payload?;
    let product = state.db.create_product(request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            success: true,
            message: "Product created successfully".to_string(),
            product: product.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/manage/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product", body = ProductBody),
        (status = 404, description = "No such product", body = ApiErrorResponse)
    ),
    tag = "manage"
)]
pub async fn get_product(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<ProductBody>> {
    require_catalog_writer(&principal)?;
    let Path(id) = id?;
    Ok(Json(state.db.get_product(id).await?.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/manage/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    request_body = ProductUpdateRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "No fields to update", body = ApiErrorResponse),
        (status = 404, description = "No such product or category", body = ApiErrorResponse)
    ),
    tag = "manage"
)]
pub async fn update_product(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ProductUpdateRequest>, JsonRejection>,
) -> ApiResult<Json<ProductResponse>> {
    require_catalog_writer(&principal)?;
    let Path(id) = id?;
    let Json(request) = payload?;
    let product = state.db.update_product(id, request.into()).await?;
    Ok(Json(ProductResponse {
        success: true,
        message: "Product updated successfully".to_string(),
        product: product.into(),
    }))
}

/// Deletes the product, then its image file. A failure to remove the file
/// is logged and does not fail the request.
#[utoipa::path(
    delete,
    path = "/api/v1/manage/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted", body = SuccessResponse),
        (status = 404, description = "No such product", body = ApiErrorResponse)
    ),
    tag = "manage"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<SuccessResponse>> {
    require_catalog_writer(&principal)?;
    let Path(id) = id?;
    if let Some(image) = state.db.delete_product(id).await? {
        remove_asset(&state.config.uploads_path, &image).await;
    }
    Ok(Json(SuccessResponse::new("Product deleted successfully")))
}

/// Remove an uploaded image. Only the file name of `image` is used, so a
/// stored path can't point outside the uploads directory.
pub(crate) async fn remove_asset(uploads: &FsPath, image: &str) {
    let Some(file_name) = FsPath::new(image).file_name() else {
        warn!("Product image path {:?} has no file name", image);
        return;
    };
    let path = uploads.join(file_name);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => info!("Removed product image {:?}", path),
        Err(e) => warn!("Could not remove product image {:?}: {}", path, e),
    }
}
