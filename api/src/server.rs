use crate::{create_router, AppState};
use database::Database;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use user::SessionConfig;

/// Deployment environment, from `ENVIRONMENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Test,
    Prd,
}

impl Environment {
    /// Production hides internal error detail from clients.
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Prd)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "test" => Ok(Environment::Test),
            "prd" | "prod" | "production" => Ok(Environment::Prd),
            other => Err(format!("unknown environment: {}", other)),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Port to listen on
    pub port: u16,
    pub environment: Environment,
    /// Directory holding product images
    pub uploads_path: PathBuf,
    pub session: SessionConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 3030,
            environment: Environment::Dev,
            uploads_path: PathBuf::from("data").join("uploads"),
            session: SessionConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Create a new API configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `ENVIRONMENT`, `API_PORT`, `DATA_PATH`, `UPLOADS_PATH` and
    /// `SESSION_SECURE_COOKIE`, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let environment = match std::env::var("ENVIRONMENT") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                warn!("{}; treating as production", e);
                Environment::Prd
            }),
            Err(_) => defaults.environment,
        };

        let port = std::env::var("API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let data_path = std::env::var("DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        let uploads_path = std::env::var("UPLOADS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_path.join("uploads"));

        Self {
            port,
            environment,
            uploads_path,
            session: SessionConfig::from_env(),
        }
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_uploads_path(mut self, path: PathBuf) -> Self {
        self.uploads_path = path;
        self
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }
}

/// Start the API server with the given configuration
pub async fn start_server_with_config(
    db: Arc<Database>,
    config: ApiConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let port = config.port;
    let state = AppState::new(db, config).await?;
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on {}", addr);
    info!("Swagger UI available at http://localhost:{}/api/v1/swagger", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

/// Start the API server with configuration from the environment
pub async fn start_server(db: Arc<Database>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    start_server_with_config(db, ApiConfig::from_env()).await
}

/// Start the API server in a background task with custom configuration
pub fn spawn_server_with_config(db: Arc<Database>, config: ApiConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = start_server_with_config(db, config).await {
            tracing::error!("API server error: {}", e);
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
