//! Session plumbing on tower-sessions.
//!
//! Only the account id lives in the session. The role is read back from the
//! directory on every request, so a role change or a deleted account takes
//! effect on the next call.

use authz::{Principal, PrincipalId};
use serde::{Deserialize, Serialize};
use std::env;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore};
use tracing::debug;

use crate::directory::UserDirectory;
use crate::error::Result;
use crate::types::UserRecord;

/// Session keys used for storing data
pub struct SessionKeys;

impl SessionKeys {
    pub const USER_ID: &'static str = "user_id";
    pub const USERNAME: &'static str = "username";
    pub const LOGGED_IN_AT: &'static str = "logged_in_at";
}

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session cookie name
    pub cookie_name: String,
    /// Inactivity timeout in seconds
    pub timeout_seconds: i64,
    /// Whether to use secure cookies (HTTPS only)
    pub secure: bool,
    /// SameSite cookie attribute
    pub same_site: SameSiteConfig,
    /// HTTP only cookie (not accessible via JavaScript)
    pub http_only: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "showcase_session".to_string(),
            timeout_seconds: 86400,
            secure: false,
            same_site: SameSiteConfig::Lax,
            http_only: true,
        }
    }
}

impl SessionConfig {
    /// Defaults, with `SESSION_SECURE_COOKIE` deciding the secure flag.
    pub fn from_env() -> Self {
        let secure = env::var("SESSION_SECURE_COOKIE")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Self {
            secure,
            ..Self::default()
        }
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Build the session layer over `store`.
    pub fn layer<S: SessionStore + Clone>(&self, store: S) -> SessionManagerLayer<S> {
        SessionManagerLayer::new(store)
            .with_name(self.cookie_name.clone())
            .with_secure(self.secure)
            .with_http_only(self.http_only)
            .with_same_site(self.same_site.into())
            .with_expiry(Expiry::OnInactivity(Duration::seconds(self.timeout_seconds)))
    }
}

/// SameSite cookie configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum SameSiteConfig {
    Strict,
    Lax,
    None,
}

impl From<SameSiteConfig> for tower_sessions::cookie::SameSite {
    fn from(config: SameSiteConfig) -> Self {
        match config {
            SameSiteConfig::Strict => tower_sessions::cookie::SameSite::Strict,
            SameSiteConfig::Lax => tower_sessions::cookie::SameSite::Lax,
            SameSiteConfig::None => tower_sessions::cookie::SameSite::None,
        }
    }
}

/// Reads and writes the login state of a session.
pub struct SessionManager;

impl SessionManager {
    /// Log `user` in. The session id is rotated first.
    pub async fn establish(session: &Session, user: &UserRecord) -> Result<()> {
        session.cycle_id().await?;
        session.insert(SessionKeys::USER_ID, user.id).await?;
        session.insert(SessionKeys::USERNAME, &user.username).await?;
        session
            .insert(SessionKeys::LOGGED_IN_AT, chrono::Utc::now())
            .await?;

        debug!("Session established for account {}", user.id);
        Ok(())
    }

    /// The account id stored in the session, if any.
    pub async fn user_id(session: &Session) -> Result<Option<PrincipalId>> {
        Ok(session.get(SessionKeys::USER_ID).await?)
    }

    /// The account behind the session. Missing or stale ids give `None`.
    pub async fn current_user(
        session: &Session,
        directory: &UserDirectory,
    ) -> Result<Option<UserRecord>> {
        match Self::user_id(session).await? {
            Some(id) => directory.lookup(id).await,
            None => Ok(None),
        }
    }

    /// The principal of the request. Missing or stale ids give anonymous.
    pub async fn current_principal(
        session: &Session,
        directory: &UserDirectory,
    ) -> Result<Principal> {
        match Self::user_id(session).await? {
            Some(id) => directory.principal_for(id).await,
            None => Ok(Principal::anonymous()),
        }
    }

    /// Log out.
    pub async fn destroy(session: &Session) -> Result<()> {
        session.flush().await?;
        debug!("Session destroyed");
        Ok(())
    }
}
