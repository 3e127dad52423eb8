use crate::utils::env_paths::{get_environment, EnvPaths};
use anyhow::Result;
use colored::*;
use database::init::{initialize_database, DatabaseConfig};
use serde_json::json;
use user::UserDirectory;

/// Execute the health check command
pub async fn execute(env_paths: &EnvPaths, format: String) -> Result<()> {
    let health_status = check_system_health(env_paths).await;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&health_status)?),
        _ => print_health_status_text(&health_status),
    }

    Ok(())
}

async fn check_system_health(env_paths: &EnvPaths) -> serde_json::Value {
    let mut status = json!({
        "status": "healthy",
        "environment": get_environment(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "components": {}
    });

    status["components"]["database"] = check_database_health(env_paths).await;
    status["components"]["uploads"] = check_uploads_health(env_paths);
    status["components"]["api"] = check_api_health().await;

    // An API that isn't running or a database not created yet is not a fault
    let degraded = status["components"]
        .as_object()
        .map(|components| {
            components.values().any(|v| {
                matches!(
                    v["status"].as_str().unwrap_or("unknown"),
                    "unhealthy" | "warning"
                )
            })
        })
        .unwrap_or(false);
    if degraded {
        status["status"] = json!("degraded");
    }

    status
}

/// The database file, its tables, and the accounts in it. A missing file is
/// reported, never created.
async fn check_database_health(env_paths: &EnvPaths) -> serde_json::Value {
    let db_path = &env_paths.database_path;
    if !db_path.exists() {
        return json!({
            "status": "not_initialized",
            "message": "Database file does not exist yet",
            "path": db_path.display().to_string()
        });
    }

    let config = DatabaseConfig::new_with_path(db_path.clone()).with_create_tables(false);
    let db = match initialize_database(config).await {
        Ok(db) => db,
        Err(e) => {
            return json!({
                "status": "unhealthy",
                "message": format!("Database exists but cannot be accessed: {}", e),
                "path": db_path.display().to_string()
            })
        }
    };

    let mut missing = Vec::new();
    for table in ["categories", "products", "user_permissions", "users"] {
        if !db.table_exists(table).await.unwrap_or(false) {
            missing.push(table);
        }
    }
    if !missing.is_empty() {
        return json!({
            "status": "warning",
            "message": "Database is missing tables; run `showcase serve` once to create them",
            "path": db_path.display().to_string(),
            "missing": missing
        });
    }

    let accounts = match UserDirectory::new(db.get_pool()).await {
        Ok(directory) => directory.count_users().await.unwrap_or(0),
        Err(_) => 0,
    };

    json!({
        "status": if accounts > 0 { "healthy" } else { "warning" },
        "message": if accounts > 0 {
            format!("Database is accessible with {} account(s)", accounts)
        } else {
            "Database has no accounts; create one with `showcase user add`".to_string()
        },
        "path": db_path.display().to_string(),
        "accounts": accounts
    })
}

fn check_uploads_health(env_paths: &EnvPaths) -> serde_json::Value {
    let uploads = &env_paths.uploads_path;
    if uploads.is_dir() {
        json!({
            "status": "healthy",
            "message": "Uploads directory present",
            "path": uploads.display().to_string()
        })
    } else {
        json!({
            "status": "not_initialized",
            "message": "Uploads directory is created when the server starts",
            "path": uploads.display().to_string()
        })
    }
}

/// Probe a locally running API on `API_PORT` (default 3030).
async fn check_api_health() -> serde_json::Value {
    let port = std::env::var("API_PORT").unwrap_or_else(|_| "3030".to_string());
    let endpoint = format!("http://localhost:{}", port);
    let api_url = format!("{}/api/v1/health", endpoint);

    match reqwest::get(&api_url).await {
        Ok(response) if response.status().is_success() => json!({
            "status": "healthy",
            "message": "API server is running and responsive",
            "endpoint": endpoint
        }),
        Ok(response) => json!({
            "status": "unhealthy",
            "message": format!("API server returned status: {}", response.status()),
            "endpoint": endpoint
        }),
        Err(_) => json!({
            "status": "offline",
            "message": "API server is not running or not reachable",
            "endpoint": endpoint
        }),
    }
}

/// Print health status in a formatted text output
fn print_health_status_text(status: &serde_json::Value) {
    println!("{}", "=== Showcase Health Check ===".bold());
    println!();

    let status_display = match status["status"].as_str().unwrap_or("unknown") {
        "healthy" => "HEALTHY".green().bold(),
        "degraded" => "DEGRADED".yellow().bold(),
        _ => "UNKNOWN".white().bold(),
    };

    println!("Overall Status: {}", status_display);
    println!("Environment: {}", status["environment"].as_str().unwrap_or(""));
    println!("Timestamp: {}", status["timestamp"].as_str().unwrap_or(""));
    println!();

    println!("{}", "Components:".bold());
    println!("{}", "─".repeat(50));

    if let Some(components) = status["components"].as_object() {
        for (name, component) in components {
            let comp_status = component["status"].as_str().unwrap_or("unknown");
            let status_icon = match comp_status {
                "healthy" => "✓".green(),
                "unhealthy" => "✗".red(),
                "warning" => "⚠".yellow(),
                "offline" | "not_initialized" => "○".white(),
                _ => "?".white(),
            };
            let status_text = match comp_status {
                "healthy" => comp_status.green(),
                "unhealthy" => comp_status.red(),
                "warning" => comp_status.yellow(),
                _ => comp_status.white(),
            };

            println!(
                "{} {} ({})",
                status_icon,
                name.to_uppercase().bold(),
                status_text
            );
            if let Some(message) = component["message"].as_str() {
                println!("  {}", message);
            }
            if let Some(path) = component["path"].as_str() {
                println!("  Path: {}", path);
            }
            println!();
        }
    }
}
