//! Atomic replacement of a principal's grant set.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{AuthzError, Result};
use crate::gate::require_super;
use crate::store::Store;
use crate::types::{CategoryId, Grant, GrantSummary, Principal, PrincipalId, ProductId};

/// Rewrites grants. The only writer of the grant table.
#[derive(Clone)]
pub struct PermissionResolver {
    store: Arc<dyn Store>,
}

impl PermissionResolver {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Replaces every grant of `principal_id` with the given categories and
    /// products, in one transaction.
    ///
    /// Ids `<= 0` are dropped. Each product grant caches the product's
    /// current category; products that can't be resolved are still granted,
    /// with no cached category. On any failure nothing is applied and the
    /// previous grant set stays in place, so a failed call is safe to retry.
    pub async fn replace_grants(
        &self,
        caller: &Principal,
        principal_id: PrincipalId,
        category_ids: &[CategoryId],
        product_ids: &[ProductId],
    ) -> Result<GrantSummary> {
        require_super(caller)?;
        if principal_id <= 0 {
            return Err(AuthzError::InvalidArgument(
                "User ID is required".to_string(),
            ));
        }

        let categories = positive_ids(category_ids);
        let products = positive_ids(product_ids);
        debug!(
            "Replacing grants for principal {}: categories={:?} products={:?}",
            principal_id, categories, products
        );

        // Dropping `tx` on any early return below rolls the transaction back.
        let mut tx = self.store.begin().await?;

        let removed = tx.delete_grants(principal_id).await?;

        let lookup: Vec<ProductId> = products.iter().copied().collect();
        let product_categories = if lookup.is_empty() {
            Default::default()
        } else {
            tx.product_category_map(&lookup).await?
        };

        for &category_id in &categories {
            tx.insert_grant(&Grant::category(principal_id, category_id))
                .await?;
        }

        for &product_id in &products {
            let cached = product_categories.get(&product_id).copied();
            if cached.is_none() {
                warn!(
                    "Product {} has no resolvable category; granting principal {} without one",
                    product_id, principal_id
                );
            }
            tx.insert_grant(&Grant::product(principal_id, product_id, cached))
                .await?;
        }

        tx.commit().await?;

        let summary = GrantSummary {
            categories_granted: categories.len(),
            products_granted: products.len(),
        };
        info!(
            "Replaced {} grants for principal {} with {} category and {} product grants",
            removed, principal_id, summary.categories_granted, summary.products_granted
        );
        Ok(summary)
    }
}

fn positive_ids(ids: &[i64]) -> BTreeSet<i64> {
    ids.iter().copied().filter(|id| *id > 0).collect()
}
