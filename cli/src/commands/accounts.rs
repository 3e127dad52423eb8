use crate::utils::env_paths::EnvPaths;
use anyhow::{Context, Result};
use authz::Role;
use colored::*;
use database::init::{initialize_database, DatabaseConfig};
use user::{NewUser, UserDirectory};

/// Open the database and the account directory over it, creating both
/// schemas when missing.
pub async fn open_directory(env_paths: &EnvPaths) -> Result<(std::sync::Arc<database::Database>, UserDirectory)> {
    let db = initialize_database(DatabaseConfig::new_with_path(
        env_paths.database_path.clone(),
    ))
    .await
    .with_context(|| format!("Cannot open database {}", env_paths.database_path.display()))?;
    let directory = UserDirectory::new(db.get_pool()).await?;
    Ok((db, directory))
}

/// Create an account. The first super admin has to come from here, since
/// signup only ever creates admins.
pub async fn add(
    env_paths: &EnvPaths,
    username: String,
    name: String,
    email: String,
    password: String,
    role: String,
) -> Result<()> {
    let role: Role = role.trim().to_ascii_lowercase().parse()?;
    let (_db, directory) = open_directory(env_paths).await?;

    let record = directory
        .create_user(NewUser {
            name,
            username,
            email,
            password,
            role,
        })
        .await?;

    println!(
        "{} Created {} account '{}' with id {}",
        "✓".green(),
        record.role,
        record.username,
        record.id
    );
    Ok(())
}

pub async fn list(env_paths: &EnvPaths, format: String) -> Result<()> {
    let (_db, directory) = open_directory(env_paths).await?;
    let users = directory.list_users().await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    println!("{}", "Accounts".bold().underline());
    if users.is_empty() {
        println!("  (none)");
    }
    for user in &users {
        println!(
            "  {:>4}  {:<20} {:<6} {}",
            user.id,
            user.username.cyan(),
            user.role.to_string(),
            user.email
        );
    }
    println!("\nTotal accounts: {}", users.len());
    Ok(())
}
