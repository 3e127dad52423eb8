//! Visibility rules for categories and products.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use crate::error::{AuthzError, Result};
use crate::gate::{require_authenticated, require_super};
use crate::store::Store;
use crate::types::{
    AccessScope, Category, CategoryId, GrantKind, GrantSet, Principal, PrincipalId,
    ProductListing, ProductView, Role,
};

/// Read-only authorization engine.
///
/// Holds no per-request state. One instance is shared by every request
/// handler; the principal is always passed in explicitly.
///
/// # Example
///
/// ```rust,ignore
/// let engine = AuthzEngine::new(store);
/// let listing = engine.visible_products(&principal, Some(7)).await?;
/// if !listing.show_price {
///     assert!(listing.products.iter().all(|p| p.price.is_none()));
/// }
/// ```
#[derive(Clone)]
pub struct AuthzEngine {
    store: Arc<dyn Store>,
}

impl AuthzEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Categories the principal may see.
    ///
    /// - Super and Anonymous: every category, by name.
    /// - Admin: categories named by its category grants, by id then name.
    ///   Grants pointing at deleted categories are ignored.
    pub async fn visible_categories(&self, principal: &Principal) -> Result<Vec<Category>> {
        let categories = match principal.role() {
            Role::Super | Role::Anonymous => self.store.list_categories().await?,
            Role::Admin => {
                let granted = self
                    .granted_ids(require_authenticated(principal)?, GrantKind::Category)
                    .await?;
                let mut categories: Vec<Category> = self
                    .store
                    .list_categories()
                    .await?
                    .into_iter()
                    .filter(|category| granted.contains(&category.id))
                    .collect();
                categories.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.name.cmp(&b.name)));
                categories
            }
        };

        debug!(
            "Visible categories for {}: {}",
            principal.role(),
            categories.len()
        );
        Ok(categories)
    }

    /// Products of one category the principal may see, with prices redacted
    /// for anonymous callers.
    ///
    /// `category_id` is mandatory; `None` is `InvalidArgument`.
    pub async fn visible_products(
        &self,
        principal: &Principal,
        category_id: Option<CategoryId>,
    ) -> Result<ProductListing> {
        let category_id = category_id
            .ok_or_else(|| AuthzError::InvalidArgument("Category ID is required".to_string()))?;

        let products = self.store.get_products_by_category(category_id).await?;
        let products = match principal.role() {
            Role::Super | Role::Anonymous => products,
            Role::Admin => {
                let granted = self
                    .granted_ids(require_authenticated(principal)?, GrantKind::Product)
                    .await?;
                products
                    .into_iter()
                    .filter(|product| granted.contains(&product.id))
                    .collect()
            }
        };

        let show_price = principal.shows_price();
        let products: Vec<ProductView> = products
            .into_iter()
            .map(|product| ProductView::from_product(product, show_price))
            .collect();

        debug!(
            "Visible products for {} in category {}: {} (show_price={})",
            principal.role(),
            category_id,
            products.len(),
            show_price
        );
        Ok(ProductListing {
            products,
            show_price,
        })
    }

    /// The grant set of `principal_id`, as seen by a Super caller.
    pub async fn grant_set(&self, caller: &Principal, principal_id: PrincipalId) -> Result<GrantSet> {
        require_super(caller)?;
        let grants = self.store.grants_for(principal_id).await?;
        Ok(grants.iter().collect())
    }

    /// The caller's own access: everything for Super, its grants for Admin.
    pub async fn access_scope(&self, principal: &Principal) -> Result<AccessScope> {
        let id = require_authenticated(principal)?;
        match principal.role() {
            Role::Super => Ok(AccessScope::All),
            Role::Admin => {
                let grants = self.store.grants_for(id).await?;
                Ok(AccessScope::Scoped(grants.iter().collect()))
            }
            Role::Anonymous => Err(AuthzError::Unauthenticated),
        }
    }

    async fn granted_ids(&self, principal_id: PrincipalId, kind: GrantKind) -> Result<BTreeSet<i64>> {
        let set: GrantSet = self.store.grants_for(principal_id).await?.iter().collect();
        Ok(match kind {
            GrantKind::Category => set.categories,
            GrantKind::Product => set.products,
        })
    }
}
