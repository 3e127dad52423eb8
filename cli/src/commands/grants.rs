use crate::commands::accounts::open_directory;
use crate::utils::env_paths::EnvPaths;
use anyhow::{anyhow, Result};
use authz::{GrantSet, PermissionResolver, Role};
use colored::*;
use serde_json::json;

pub async fn show(env_paths: &EnvPaths, user_id: i64, format: String) -> Result<()> {
    let (db, directory) = open_directory(env_paths).await?;
    let account = directory.get_user(user_id).await?;

    let grants: GrantSet = db.grant_rows(user_id).await?.iter().collect();

    if format == "json" {
        let output = json!({
            "user_id": user_id,
            "username": account.username,
            "categories": grants.categories,
            "products": grants.products,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {} ({})",
        "Grants for".bold(),
        account.username.cyan(),
        account.role
    );
    println!("  Categories: {:?}", grants.categories);
    println!("  Products:   {:?}", grants.products);
    if grants.is_empty() && account.role == Role::Admin {
        println!("  {}", "This administrator can see nothing yet.".yellow());
    }
    Ok(())
}

pub async fn set(
    env_paths: &EnvPaths,
    user_id: i64,
    categories: Vec<i64>,
    products: Vec<i64>,
    operator: String,
) -> Result<()> {
    let (db, directory) = open_directory(env_paths).await?;
    let operator = directory
        .find_by_username(&operator)
        .await?
        .ok_or_else(|| anyhow!("Operator '{}' not found", operator))?;
    directory.get_user(user_id).await?;

    let summary = PermissionResolver::new(db)
        .replace_grants(&operator.principal(), user_id, &categories, &products)
        .await?;

    println!(
        "{} Permissions updated: {} categories, {} products",
        "✓".green(),
        summary.categories_granted,
        summary.products_granted
    );
    Ok(())
}
