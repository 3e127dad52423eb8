//! Data-access seams consumed by the engine and the resolver.
//!
//! The core never talks to a database directly. Implementations live in the
//! `database` crate (SQLite) and in the test harness.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;
use crate::types::{Category, CategoryId, Grant, PrincipalId, Product, ProductId};

/// Read access to categories and products.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_category_by_id(&self, id: CategoryId) -> Result<Option<Category>>;

    /// All categories, ordered by name ascending.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Products whose category is `category_id`, ordered by name ascending.
    async fn get_products_by_category(&self, category_id: CategoryId) -> Result<Vec<Product>>;

    /// Current category of each listed product. Unknown products are absent.
    async fn get_product_category_map(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, CategoryId>>;
}

/// Read access to grants, and the only way to change them.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Every grant row held by `principal_id`, in no particular order.
    async fn grants_for(&self, principal_id: PrincipalId) -> Result<Vec<Grant>>;

    /// Opens a transaction for rewriting grants.
    async fn begin(&self) -> Result<Box<dyn GrantTransaction>>;
}

/// A scoped grant transaction.
///
/// Nothing written through it is visible to readers until `commit` returns
/// successfully. Dropping it without committing, including when the owning
/// future is cancelled, rolls everything back.
#[async_trait]
pub trait GrantTransaction: Send {
    /// Removes every grant of `principal_id`, returning the number removed.
    async fn delete_grants(&mut self, principal_id: PrincipalId) -> Result<u64>;

    /// Same lookup as [`CatalogStore::get_product_category_map`], inside the transaction.
    async fn product_category_map(
        &mut self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, CategoryId>>;

    async fn insert_grant(&mut self, grant: &Grant) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Everything the engine and resolver need from a backing store.
pub trait Store: CatalogStore + PermissionStore {}

impl<T: CatalogStore + PermissionStore> Store for T {}
