//! In-memory store used by the unit tests of this crate.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{AuthzError, Result};
use crate::store::{CatalogStore, GrantTransaction, PermissionStore};
use crate::types::{Category, CategoryId, Grant, PrincipalId, Product, ProductId};

#[derive(Default)]
pub(crate) struct MemoryStore {
    categories: Vec<Category>,
    products: Vec<Product>,
    grants: Arc<Mutex<Vec<Grant>>>,
    fail_insert_for: Option<ProductId>,
    unavailable: bool,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_category(mut self, id: CategoryId, name: &str) -> Self {
        self.categories.push(Category {
            id,
            name: name.to_string(),
            description: String::new(),
        });
        self
    }

    pub(crate) fn with_product(
        mut self,
        id: ProductId,
        name: &str,
        category_id: CategoryId,
        price: f64,
    ) -> Self {
        self.products.push(Product {
            id,
            name: name.to_string(),
            category_id,
            image: None,
            sku: format!("SKU-{}", id),
            description: String::new(),
            price,
        });
        self
    }

    pub(crate) fn with_grant(self, grant: Grant) -> Self {
        self.grants
            .try_lock()
            .expect("store is not shared yet")
            .push(grant);
        self
    }

    /// Makes inserting a grant for `product_id` fail inside the transaction.
    pub(crate) fn fail_insert_for_product(mut self, product_id: ProductId) -> Self {
        self.fail_insert_for = Some(product_id);
        self
    }

    /// Makes every read fail as if the store were unreachable.
    pub(crate) fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            Err(AuthzError::Unavailable("memory store offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn category_map(&self, ids: &[ProductId]) -> HashMap<ProductId, CategoryId> {
        self.products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .map(|p| (p.id, p.category_id))
            .collect()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn get_category_by_id(&self, id: CategoryId) -> Result<Option<Category>> {
        self.check_available()?;
        Ok(self.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.check_available()?;
        let mut categories = self.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_products_by_category(&self, category_id: CategoryId) -> Result<Vec<Product>> {
        self.check_available()?;
        let mut products: Vec<Product> = self
            .products
            .iter()
            .filter(|p| p.category_id == category_id)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn get_product_category_map(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, CategoryId>> {
        self.check_available()?;
        Ok(self.category_map(product_ids))
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn grants_for(&self, principal_id: PrincipalId) -> Result<Vec<Grant>> {
        self.check_available()?;
        let grants = self.grants.lock().await;
        Ok(grants
            .iter()
            .filter(|g| g.principal_id == principal_id)
            .cloned()
            .collect())
    }

    async fn begin(&self) -> Result<Box<dyn GrantTransaction>> {
        self.check_available()?;
        let guard = self.grants.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction {
            guard,
            staged,
            categories: self.category_map(
                &self.products.iter().map(|p| p.id).collect::<Vec<_>>(),
            ),
            fail_insert_for: self.fail_insert_for,
        }))
    }
}

/// Holds the grant lock for its whole life, so transactions serialize.
struct MemoryTransaction {
    guard: OwnedMutexGuard<Vec<Grant>>,
    staged: Vec<Grant>,
    categories: HashMap<ProductId, CategoryId>,
    fail_insert_for: Option<ProductId>,
}

#[async_trait]
impl GrantTransaction for MemoryTransaction {
    async fn delete_grants(&mut self, principal_id: PrincipalId) -> Result<u64> {
        let before = self.staged.len();
        self.staged.retain(|g| g.principal_id != principal_id);
        Ok((before - self.staged.len()) as u64)
    }

    async fn product_category_map(
        &mut self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, CategoryId>> {
        Ok(product_ids
            .iter()
            .filter_map(|id| self.categories.get(id).map(|c| (*id, *c)))
            .collect())
    }

    async fn insert_grant(&mut self, grant: &Grant) -> Result<()> {
        if grant.product_id.is_some() && grant.product_id == self.fail_insert_for {
            return Err(AuthzError::Unavailable("injected insert failure".to_string()));
        }
        self.staged.push(grant.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }
}
