use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

mod commands;
mod logging;
mod utils;

use commands::{accounts, grants, health, serve};
use utils::env_paths::EnvPaths;

/// Showcase - product catalog server and administration
#[derive(Parser)]
#[command(name = "showcase")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// SQLite database file (defaults to <DATA_PATH>/showcase.db)
    #[arg(long, global = true, env = "DATABASE_PATH")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Port to listen on (overrides API_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check system health and status
    Health {
        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Account management commands
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Inspect and replace an administrator's grants
    Grants {
        #[command(subcommand)]
        action: GrantsAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "SHOWCASE_PASSWORD", hide_env_values = true)]
        password: String,
        /// admin or super
        #[arg(long, default_value = "super")]
        role: String,
    },

    /// List accounts, newest first
    List {
        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
enum GrantsAction {
    /// Show the grants of an account
    Show {
        user_id: i64,
        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Replace every grant of an account
    Set {
        user_id: i64,
        /// Comma-separated category ids
        #[arg(long, value_delimiter = ',')]
        categories: Vec<i64>,
        /// Comma-separated product ids
        #[arg(long, value_delimiter = ',')]
        products: Vec<i64>,
        /// Username of the super admin making the change
        #[arg(long)]
        operator: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_paths = match EnvPaths::load() {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let env_paths = match cli.database {
        Some(path) => env_paths.with_database_path(path),
        None => env_paths,
    };

    if let Commands::Serve { port } = cli.command {
        let _guard = logging::init_server_logging(&env_paths, cli.verbose)?;
        return serve::execute(&env_paths, port).await;
    }

    logging::init_console_logging(cli.verbose);
    let result = match cli.command {
        Commands::Serve { .. } => Ok(()),
        Commands::Health { format } => health::execute(&env_paths, format).await,
        Commands::User { action } => match action {
            UserAction::Add {
                username,
                name,
                email,
                password,
                role,
            } => accounts::add(&env_paths, username, name, email, password, role).await,
            UserAction::List { format } => accounts::list(&env_paths, format).await,
        },
        Commands::Grants { action } => match action {
            GrantsAction::Show { user_id, format } => {
                grants::show(&env_paths, user_id, format).await
            }
            GrantsAction::Set {
                user_id,
                categories,
                products,
                operator,
            } => grants::set(&env_paths, user_id, categories, products, operator).await,
        },
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}
