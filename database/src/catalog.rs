//! Categories and products: the reads behind the catalog store and the
//! writes behind the management endpoints.

use async_trait::async_trait;
use authz::{CatalogStore, Category, CategoryId, Product, ProductId};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::{DatabaseError, Result};
use crate::{placeholders, Database};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial category update. `None` leaves a column unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category_id: CategoryId,
    #[serde(default)]
    pub image: Option<String>,
    pub sku: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
}

/// Partial product update. `None` leaves a column unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category_id: Option<CategoryId>,
    pub image: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
}

const CATEGORY_COLUMNS: &str = "id, name, description";
const PRODUCT_COLUMNS: &str = "id, name, category_id, image, sku, description, price";

fn category_from_row(row: &SqliteRow) -> std::result::Result<Category, sqlx::Error> {
    Ok(Category {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
    })
}

fn product_from_row(row: &SqliteRow) -> std::result::Result<Product, sqlx::Error> {
    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        category_id: row.try_get("category_id")?,
        image: row.try_get("image")?,
        sku: row.try_get("sku")?,
        description: row.try_get("description")?,
        price: row.try_get("price")?,
    })
}

/// Trimmed value, or `None` when nothing but whitespace is left.
fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn check_price(price: f64) -> Result<()> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(DatabaseError::Validation(
            "Price must be greater than zero".to_string(),
        ))
    }
}

/// Current category of each listed product, on any executor so the grant
/// transaction can run the same lookup.
pub(crate) async fn fetch_product_categories<'c, E>(
    executor: E,
    product_ids: &[ProductId],
) -> Result<HashMap<ProductId, CategoryId>>
where
    E: sqlx::Executor<'c, Database = Sqlite>,
{
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!(
        "SELECT id, category_id FROM products WHERE id IN ({})",
        placeholders(product_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in product_ids {
        query = query.bind(*id);
    }

    let mut map = HashMap::with_capacity(product_ids.len());
    for row in query.fetch_all(executor).await? {
        map.insert(row.try_get("id")?, row.try_get("category_id")?);
    }
    Ok(map)
}

impl Database {
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(category_from_row).transpose()?)
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(product_from_row).transpose()?)
    }

    async fn ensure_category_exists(&self, id: CategoryId) -> Result<()> {
        match self.find_category(id).await? {
            Some(_) => Ok(()),
            None => Err(DatabaseError::EntityNotFound("Category not found".to_string())),
        }
    }

    /// Every category, by name.
    pub async fn all_categories(&self) -> Result<Vec<Category>> {
        let sql = format!(
            "SELECT {} FROM categories ORDER BY name ASC, id ASC",
            CATEGORY_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(category_from_row)
            .collect::<std::result::Result<_, _>>()?)
    }

    pub async fn get_category(&self, id: CategoryId) -> Result<Category> {
        self.find_category(id)
            .await?
            .ok_or_else(|| DatabaseError::EntityNotFound("Category not found".to_string()))
    }

    pub async fn create_category(&self, new: NewCategory) -> Result<Category> {
        let name = non_blank(Some(&new.name)).ok_or_else(|| {
            DatabaseError::Validation("Category name is required".to_string())
        })?;
        let description = new.description.unwrap_or_default().trim().to_string();

        let id = sqlx::query("INSERT INTO categories (name, description) VALUES (?, ?)")
            .bind(&name)
            .bind(&description)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        info!("Created category {} ({})", id, name);
        Ok(Category {
            id,
            name,
            description,
        })
    }

    /// Applies the provided fields. A blank name counts as not provided.
    pub async fn update_category(&self, id: CategoryId, update: CategoryUpdate) -> Result<Category> {
        let name = non_blank(update.name.as_deref());
        let description = update.description.map(|d| d.trim().to_string());
        if name.is_none() && description.is_none() {
            return Err(DatabaseError::Validation("No fields to update".to_string()));
        }

        let result = sqlx::query(
            r#"
            UPDATE categories
            SET name = COALESCE(?, name),
                description = COALESCE(?, description)
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::EntityNotFound("Category not found".to_string()));
        }

        info!("Updated category {}", id);
        self.get_category(id).await
    }

    /// Removes the category row only. Its products and any grants naming it
    /// are left in place.
    pub async fn delete_category(&self, id: CategoryId) -> Result<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::EntityNotFound("Category not found".to_string()));
        }
        info!("Deleted category {}", id);
        Ok(())
    }

    /// Every product, by name.
    pub async fn all_products(&self) -> Result<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products ORDER BY name ASC, id ASC",
            PRODUCT_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(product_from_row)
            .collect::<std::result::Result<_, _>>()?)
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Product> {
        self.find_product(id)
            .await?
            .ok_or_else(|| DatabaseError::EntityNotFound("Product not found".to_string()))
    }

    pub async fn create_product(&self, new: NewProduct) -> Result<Product> {
        let name = non_blank(Some(&new.name))
            .ok_or_else(|| DatabaseError::Validation("Product name is required".to_string()))?;
        let sku = non_blank(Some(&new.sku))
            .ok_or_else(|| DatabaseError::Validation("SKU is required".to_string()))?;
        check_price(new.price)?;
        self.ensure_category_exists(new.category_id).await?;

        let description = new.description.unwrap_or_default().trim().to_string();
        let image = non_blank(new.image.as_deref());

        let id = sqlx::query(
            r#"
            INSERT INTO products (name, category_id, image, sku, description, price)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&name)
        .bind(new.category_id)
        .bind(&image)
        .bind(&sku)
        .bind(&description)
        .bind(new.price)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        info!("Created product {} ({}) in category {}", id, name, new.category_id);
        Ok(Product {
            id,
            name,
            category_id: new.category_id,
            image,
            sku,
            description,
            price: new.price,
        })
    }

    /// Applies the provided fields. Blank names and skus count as not
    /// provided; a new category must exist.
    ///
    /// Grants keep the category they cached when they were written.
    pub async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Product> {
        let name = non_blank(update.name.as_deref());
        let sku = non_blank(update.sku.as_deref());
        let image = non_blank(update.image.as_deref());
        let description = update.description.map(|d| d.trim().to_string());

        if name.is_none()
            && sku.is_none()
            && image.is_none()
            && description.is_none()
            && update.category_id.is_none()
            && update.price.is_none()
        {
            return Err(DatabaseError::Validation("No fields to update".to_string()));
        }
        if let Some(price) = update.price {
            check_price(price)?;
        }
        if let Some(category_id) = update.category_id {
            self.ensure_category_exists(category_id).await?;
        }

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = COALESCE(?, name),
                category_id = COALESCE(?, category_id),
                image = COALESCE(?, image),
                sku = COALESCE(?, sku),
                description = COALESCE(?, description),
                price = COALESCE(?, price)
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(update.category_id)
        .bind(image)
        .bind(sku)
        .bind(description)
        .bind(update.price)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::EntityNotFound("Product not found".to_string()));
        }

        info!("Updated product {}", id);
        self.get_product(id).await
    }

    /// Deletes the product and returns its image path, if it had one, so the
    /// caller can remove the asset.
    pub async fn delete_product(&self, id: ProductId) -> Result<Option<String>> {
        let mut tx = self.pool.begin().await?;

        let image: Option<Option<String>> =
            sqlx::query_scalar("SELECT image FROM products WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(image) = image else {
            return Err(DatabaseError::EntityNotFound("Product not found".to_string()));
        };

        sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Deleted product {}", id);
        Ok(image)
    }
}

#[async_trait]
impl CatalogStore for Database {
    async fn get_category_by_id(&self, id: CategoryId) -> authz::Result<Option<Category>> {
        Ok(self.find_category(id).await?)
    }

    async fn list_categories(&self) -> authz::Result<Vec<Category>> {
        Ok(self.all_categories().await?)
    }

    async fn get_products_by_category(
        &self,
        category_id: CategoryId,
    ) -> authz::Result<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE category_id = ? ORDER BY name ASC, id ASC",
            PRODUCT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(category_id)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        let products: Vec<Product> = rows
            .iter()
            .map(product_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(DatabaseError::from)?;

        debug!("Category {} has {} products", category_id, products.len());
        Ok(products)
    }

    async fn get_product_category_map(
        &self,
        product_ids: &[ProductId],
    ) -> authz::Result<HashMap<ProductId, CategoryId>> {
        Ok(fetch_product_categories(&self.pool, product_ids).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::migrated_db;
    use rstest::rstest;

    fn lamp(category_id: CategoryId) -> NewProduct {
        NewProduct {
            name: "Lamp".to_string(),
            category_id,
            image: Some("uploads/lamp.png".to_string()),
            sku: "L-1".to_string(),
            description: None,
            price: 19.5,
        }
    }

    async fn category(db: &Database, name: &str) -> Category {
        db.create_category(NewCategory {
            name: name.to_string(),
            description: None,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_category_crud() {
        let (_dir, db) = migrated_db().await;

        let created = db
            .create_category(NewCategory {
                name: "  Lighting  ".to_string(),
                description: Some("Lamps".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(created.name, "Lighting");
        assert_eq!(db.get_category(created.id).await.unwrap(), created);

        let updated = db
            .update_category(
                created.id,
                CategoryUpdate {
                    name: None,
                    description: Some("Lamps and bulbs".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Lighting");
        assert_eq!(updated.description, "Lamps and bulbs");

        db.delete_category(created.id).await.unwrap();
        assert!(matches!(
            db.get_category(created.id).await,
            Err(DatabaseError::EntityNotFound(_))
        ));
        assert!(matches!(
            db.delete_category(created.id).await,
            Err(DatabaseError::EntityNotFound(_))
        ));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[tokio::test]
    async fn test_blank_category_name_rejected(#[case] name: &str) {
        let (_dir, db) = migrated_db().await;
        let result = db
            .create_category(NewCategory {
                name: name.to_string(),
                description: None,
            })
            .await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
    }

    #[tokio::test]
    async fn test_empty_update_rejected() {
        let (_dir, db) = migrated_db().await;
        let garden = category(&db, "Garden").await;

        let result = db
            .update_category(
                garden.id,
                CategoryUpdate {
                    name: Some("  ".to_string()),
                    description: None,
                },
            )
            .await;
        assert!(
            matches!(result, Err(DatabaseError::Validation(msg)) if msg == "No fields to update")
        );

        let result = db.update_product(1, ProductUpdate::default()).await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
    }

    #[tokio::test]
    async fn test_product_validation() {
        let (_dir, db) = migrated_db().await;
        let lighting = category(&db, "Lighting").await;

        let mut no_sku = lamp(lighting.id);
        no_sku.sku = " ".to_string();
        assert!(matches!(
            db.create_product(no_sku).await,
            Err(DatabaseError::Validation(_))
        ));

        let mut free = lamp(lighting.id);
        free.price = 0.0;
        assert!(matches!(
            db.create_product(free).await,
            Err(DatabaseError::Validation(_))
        ));

        assert!(matches!(
            db.create_product(lamp(lighting.id + 100)).await,
            Err(DatabaseError::EntityNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_product_update_and_delete_returns_image() {
        let (_dir, db) = migrated_db().await;
        let lighting = category(&db, "Lighting").await;
        let garden = category(&db, "Garden").await;
        let product = db.create_product(lamp(lighting.id)).await.unwrap();

        let moved = db
            .update_product(
                product.id,
                ProductUpdate {
                    category_id: Some(garden.id),
                    price: Some(21.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.category_id, garden.id);
        assert_eq!(moved.price, 21.0);
        assert_eq!(moved.name, "Lamp");

        let image = db.delete_product(product.id).await.unwrap();
        assert_eq!(image.as_deref(), Some("uploads/lamp.png"));
        assert!(matches!(
            db.delete_product(product.id).await,
            Err(DatabaseError::EntityNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_store_listings_are_ordered_by_name() {
        let (_dir, db) = migrated_db().await;
        let zebra = category(&db, "Zebra").await;
        category(&db, "Apparel").await;

        for name in ["Shade", "Bulb", "Lamp"] {
            let mut product = lamp(zebra.id);
            product.name = name.to_string();
            db.create_product(product).await.unwrap();
        }

        let categories = db.list_categories().await.unwrap();
        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Apparel", "Zebra"]);

        let products = db.get_products_by_category(zebra.id).await.unwrap();
        let names: Vec<_> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Bulb", "Lamp", "Shade"]);

        assert!(db.get_products_by_category(9999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_product_category_map_skips_unknown_products() {
        let (_dir, db) = migrated_db().await;
        let lighting = category(&db, "Lighting").await;
        let product = db.create_product(lamp(lighting.id)).await.unwrap();

        let map = db
            .get_product_category_map(&[product.id, 9999])
            .await
            .unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&product.id], lighting.id);
        assert!(db.get_product_category_map(&[]).await.unwrap().is_empty());
    }
}
