//! The principal directory: stored accounts and credential checks.

use authz::{Principal, PrincipalId, Role};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::credentials::{hash_password, verify_password};
use crate::error::{Result, UserError};
use crate::types::{NewUser, UserRecord, UserUpdate};

const USER_COLUMNS: &str = "id, name, username, email, role, created_at";

fn user_from_row(row: &SqliteRow) -> Result<UserRecord> {
    let role: String = row.try_get("role")?;
    let role = Role::from_str(&role).map_err(|_| UserError::InvalidRole(role))?;
    Ok(UserRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        role,
        created_at: row.try_get("created_at")?,
    })
}

fn trimmed(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn stored_role(role: Role) -> Result<&'static str> {
    role.as_stored()
        .ok_or_else(|| UserError::Validation("Role must be admin or super".to_string()))
}

/// Account storage on the shared SQLite pool.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    pool: Pool<Sqlite>,
}

impl UserDirectory {
    /// Wrap a pool and make sure the `users` table exists.
    pub async fn new(pool: Pool<Sqlite>) -> Result<Self> {
        let directory = Self { pool };
        directory.run_migrations().await?;
        Ok(directory)
    }

    async fn run_migrations(&self) -> Result<()> {
        info!("Running user directory migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'admin' CHECK (role IN ('admin', 'super')),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Create an account. Every field is trimmed and required.
    pub async fn create_user(&self, new: NewUser) -> Result<UserRecord> {
        let fields = (
            trimmed(&new.name),
            trimmed(&new.username),
            trimmed(&new.email),
            trimmed(&new.password),
        );
        let (Some(name), Some(username), Some(email), Some(password)) = fields else {
            return Err(UserError::Validation("All fields must be filled".to_string()));
        };
        let role = stored_role(new.role)?;

        if self.find_by_username(&username).await?.is_some() {
            return Err(UserError::DuplicateUsername);
        }

        let password_hash = hash_password(&password)?;
        let result = sqlx::query(
            "INSERT INTO users (name, username, email, password_hash, role) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&name)
        .bind(&username)
        .bind(&email)
        .bind(&password_hash)
        .bind(role)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                UserError::DuplicateUsername
            }
            other => UserError::Database(other),
        })?;

        let id = result.last_insert_rowid();
        info!("Created {} account {} ({})", role, id, username);
        self.get_user(id).await
    }

    pub async fn lookup(&self, id: PrincipalId) -> Result<Option<UserRecord>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn get_user(&self, id: PrincipalId) -> Result<UserRecord> {
        self.lookup(id)
            .await?
            .ok_or_else(|| UserError::UserNotFound("User not found".to_string()))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    /// Every account, newest first.
    pub async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at DESC, id DESC",
            USER_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(user_from_row).collect()
    }

    pub async fn update_user(&self, id: PrincipalId, update: UserUpdate) -> Result<UserRecord> {
        let name = update.name.as_deref().and_then(trimmed);
        let email = update.email.as_deref().and_then(trimmed);
        let password_hash = match update.password.as_deref().and_then(trimmed) {
            Some(password) => Some(hash_password(&password)?),
            None => None,
        };
        let role = update.role.map(stored_role).transpose()?;

        if name.is_none() && email.is_none() && password_hash.is_none() && role.is_none() {
            return Err(UserError::Validation("No fields to update".to_string()));
        }

        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE(?, name),
                email = COALESCE(?, email),
                password_hash = COALESCE(?, password_hash),
                role = COALESCE(?, role)
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound("User not found".to_string()));
        }
        info!("Updated account {}", id);
        self.get_user(id).await
    }

    /// Remove an account. Grants it held are left behind and never match a
    /// principal again.
    pub async fn delete_user(&self, id: PrincipalId) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound("User not found".to_string()));
        }
        info!("Deleted account {}", id);
        Ok(())
    }

    /// Check a username and secret. Unknown users and wrong secrets both
    /// yield `None`.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {}, password_hash FROM users WHERE username = ?",
            USER_COLUMNS
        ))
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            debug!("Login attempt for unknown username");
            return Ok(None);
        };

        let password_hash: String = row.try_get("password_hash")?;
        if !verify_password(password.trim(), &password_hash) {
            warn!("Failed login for username {}", username.trim());
            return Ok(None);
        }

        user_from_row(&row).map(Some)
    }

    /// The principal for a stored id. Ids with no account resolve to
    /// anonymous.
    pub async fn principal_for(&self, id: PrincipalId) -> Result<Principal> {
        Ok(match self.lookup(id).await? {
            Some(record) => record.principal(),
            None => {
                debug!("Session refers to missing account {}", id);
                Principal::anonymous()
            }
        })
    }

    pub async fn count_users(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
