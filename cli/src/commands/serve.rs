use crate::utils::env_paths::{get_environment, EnvPaths};
use anyhow::{anyhow, Result};
use api::ApiConfig;
use database::init::{initialize_database, DatabaseConfig};
use tracing::info;

/// Open (and migrate) the database, then serve the API until Ctrl-C.
pub async fn execute(env_paths: &EnvPaths, port: Option<u16>) -> Result<()> {
    info!(
        "Starting Showcase {} ({})",
        env!("CARGO_PKG_VERSION"),
        get_environment()
    );

    let db = initialize_database(DatabaseConfig::new_with_path(
        env_paths.database_path.clone(),
    ))
    .await?;

    std::fs::create_dir_all(&env_paths.uploads_path)?;
    let mut config = ApiConfig::from_env().with_uploads_path(env_paths.uploads_path.clone());
    if let Some(port) = port {
        config = config.with_port(port);
    }

    api::start_server_with_config(db, config)
        .await
        .map_err(|e| anyhow!(e))?;

    info!("=== Showcase shutdown complete ===");
    Ok(())
}
