//! Principal directory for the Showcase catalog: stored accounts, password
//! verification and the session state that maps a request to a principal.

pub mod credentials;
pub mod directory;
pub mod error;
pub mod session;
pub mod types;

pub use directory::UserDirectory;
pub use error::{Result as UserResult, UserError};
pub use session::{SameSiteConfig, SessionConfig, SessionKeys, SessionManager};
pub use types::{NewUser, UserRecord, UserUpdate};

// Re-exported so callers don't need a direct tower-sessions dependency.
pub use tower_sessions::{MemoryStore, Session};
