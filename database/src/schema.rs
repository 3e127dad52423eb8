//! Catalog and grant tables.
//!
//! Grants carry no foreign keys into the catalog: deleting a category or
//! product leaves its grant rows behind, and readers skip them.

use sqlx::{Pool, Sqlite};
use tracing::{debug, info};

use crate::error::Result;

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "categories",
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
    (
        "products",
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category_id INTEGER NOT NULL,
            image TEXT,
            sku TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            price REAL NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
    (
        "user_permissions",
        r#"
        CREATE TABLE IF NOT EXISTS user_permissions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            category_id INTEGER,
            product_id INTEGER,
            permission_type TEXT NOT NULL CHECK (permission_type IN ('category', 'product')),
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
    (
        "idx_user_permissions_user_id",
        "CREATE INDEX IF NOT EXISTS idx_user_permissions_user_id ON user_permissions(user_id)",
    ),
    (
        "idx_products_category_id",
        "CREATE INDEX IF NOT EXISTS idx_products_category_id ON products(category_id)",
    ),
];

/// Apply every migration. Safe to run on each startup.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    for (name, sql) in MIGRATIONS {
        debug!("Applying migration: {}", name);
        sqlx::query(sql).execute(pool).await?;
    }
    info!("Applied {} catalog migrations", MIGRATIONS.len());
    Ok(())
}
