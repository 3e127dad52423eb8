//! The `user_permissions` table behind the permission store.

use async_trait::async_trait;
use authz::{CategoryId, Grant, GrantKind, GrantTransaction, PermissionStore, PrincipalId, ProductId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

use crate::catalog::fetch_product_categories;
use crate::error::{DatabaseError, Result};
use crate::Database;

fn grant_from_row(row: &SqliteRow) -> Result<Grant> {
    let kind: String = row.try_get("permission_type")?;
    let kind = GrantKind::from_str(&kind).map_err(|e| DatabaseError::Other(e.to_string()))?;
    Ok(Grant {
        principal_id: row.try_get("user_id")?,
        category_id: row.try_get("category_id")?,
        product_id: row.try_get("product_id")?,
        kind,
    })
}

impl Database {
    /// Every grant row of `principal_id`, ordered by row id.
    pub async fn grant_rows(&self, principal_id: PrincipalId) -> Result<Vec<Grant>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, category_id, product_id, permission_type
            FROM user_permissions
            WHERE user_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(principal_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(grant_from_row).collect()
    }
}

#[async_trait]
impl PermissionStore for Database {
    async fn grants_for(&self, principal_id: PrincipalId) -> authz::Result<Vec<Grant>> {
        Ok(self.grant_rows(principal_id).await?)
    }

    async fn begin(&self) -> authz::Result<Box<dyn GrantTransaction>> {
        let tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        Ok(Box::new(SqliteGrantTransaction { tx }))
    }
}

/// A grant rewrite on one pooled connection.
///
/// SQLite takes the write lock on the first write statement, and the
/// resolver always deletes first, so two rewrites serialize on that lock and
/// wait on the busy timeout instead of interleaving. Dropping the value
/// without `commit` rolls back.
pub struct SqliteGrantTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl GrantTransaction for SqliteGrantTransaction {
    async fn delete_grants(&mut self, principal_id: PrincipalId) -> authz::Result<u64> {
        let result = sqlx::query("DELETE FROM user_permissions WHERE user_id = ?")
            .bind(principal_id)
            .execute(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;
        debug!(
            "Deleted {} grant rows for principal {}",
            result.rows_affected(),
            principal_id
        );
        Ok(result.rows_affected())
    }

    async fn product_category_map(
        &mut self,
        product_ids: &[ProductId],
    ) -> authz::Result<HashMap<ProductId, CategoryId>> {
        Ok(fetch_product_categories(&mut *self.tx, product_ids).await?)
    }

    async fn insert_grant(&mut self, grant: &Grant) -> authz::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_permissions (user_id, category_id, product_id, permission_type)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(grant.principal_id)
        .bind(grant.category_id)
        .bind(grant.product_id)
        .bind(grant.kind.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> authz::Result<()> {
        self.tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::migrated_db;

    #[tokio::test]
    async fn test_grant_rows_round_trip_through_table() {
        let (_dir, db) = migrated_db().await;

        let mut tx = db.begin().await.unwrap();
        tx.insert_grant(&Grant::category(2, 5)).await.unwrap();
        tx.insert_grant(&Grant::product(2, 42, Some(7))).await.unwrap();
        tx.insert_grant(&Grant::product(2, 777, None)).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(
            db.grants_for(2).await.unwrap(),
            vec![
                Grant::category(2, 5),
                Grant::product(2, 42, Some(7)),
                Grant::product(2, 777, None),
            ]
        );
        assert!(db.grants_for(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let (_dir, db) = migrated_db().await;

        let mut tx = db.begin().await.unwrap();
        tx.insert_grant(&Grant::category(2, 5)).await.unwrap();
        tx.commit().await.unwrap();

        {
            let mut tx = db.begin().await.unwrap();
            assert_eq!(tx.delete_grants(2).await.unwrap(), 1);
            tx.insert_grant(&Grant::category(2, 9)).await.unwrap();
        }

        assert_eq!(db.grants_for(2).await.unwrap(), vec![Grant::category(2, 5)]);
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_invisible() {
        let (_dir, db) = migrated_db().await;

        let mut tx = db.begin().await.unwrap();
        tx.insert_grant(&Grant::category(2, 5)).await.unwrap();
        assert!(db.grants_for(2).await.unwrap().is_empty());

        tx.commit().await.unwrap();
        assert_eq!(db.grants_for(2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_permission_type_is_reported() {
        let (_dir, db) = migrated_db().await;
        db.execute_raw("DROP TABLE user_permissions").await.unwrap();
        db.execute_raw(
            "CREATE TABLE user_permissions (id INTEGER PRIMARY KEY, user_id INTEGER, category_id INTEGER, product_id INTEGER, permission_type TEXT)",
        )
        .await
        .unwrap();
        db.execute_raw(
            "INSERT INTO user_permissions (user_id, category_id, permission_type) VALUES (2, 5, 'owner')",
        )
        .await
        .unwrap();

        assert!(matches!(
            db.grants_for(2).await,
            Err(authz::AuthzError::Unavailable(_))
        ));
    }
}
