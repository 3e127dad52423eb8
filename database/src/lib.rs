//! SQLite persistence for the Showcase catalog and its grant table.
//!
//! [`Database`] implements the `authz` store traits, so the engine and the
//! permission resolver run directly on top of it.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::{debug, info};

pub mod catalog;
pub mod error;
pub mod init;
pub mod permissions;
pub mod schema;

pub use catalog::{CategoryUpdate, NewCategory, NewProduct, ProductUpdate};
pub use error::{DatabaseError, Result};
pub use init::{initialize_database, DatabaseConfig};

/// Database connection pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open a database with default pool settings.
    pub async fn new(database_path: &str) -> Result<Self> {
        Self::connect(&DatabaseConfig::new().with_database_path(database_path.into())).await
    }

    /// Open a database file, creating it if missing.
    ///
    /// The pool runs in WAL mode with foreign keys on and a busy timeout, so
    /// concurrent grant writers wait for each other instead of failing.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Connecting to database at: {:?}", config.database_path);

        let options = SqliteConnectOptions::new()
            .filename(&config.database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        debug!(
            "Database connection established (max_connections={})",
            config.max_connections
        );

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Get a clone of the connection pool
    pub fn get_pool(&self) -> Pool<Sqlite> {
        self.pool.clone()
    }

    /// Create the catalog and grant tables if they do not exist.
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");
        schema::run_migrations(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Cheap round trip used by health checks.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Check if a table exists
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let query = r#"
            SELECT COUNT(*) as count
            FROM sqlite_master
            WHERE type='table' AND name=?
        "#;

        let result: (i32,) = sqlx::query_as(query)
            .bind(table_name)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0 > 0)
    }

    /// Execute raw SQL (for table creation, etc.)
    pub async fn execute_raw(&self, sql: &str) -> Result<()> {
        sqlx::query(sql).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// `?, ?, ?` for an IN-list of `count` values.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_database_connection() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("showcase.db");

        let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
        assert!(db_path.exists());
        assert!(db.pool().acquire().await.is_ok());
        db.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_table_exists() {
        let (_dir, db) = test_support::migrated_db().await;

        assert!(db.table_exists("categories").await.unwrap());
        assert!(db.table_exists("products").await.unwrap());
        assert!(db.table_exists("user_permissions").await.unwrap());
        assert!(!db.table_exists("non_existent_table").await.unwrap());
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }
}
