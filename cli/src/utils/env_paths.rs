use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Environment-based path configuration
#[derive(Debug, Clone)]
pub struct EnvPaths {
    pub data_path: PathBuf,
    pub database_path: PathBuf,
    pub uploads_path: PathBuf,
}

impl EnvPaths {
    /// Load paths from environment variables with defaults
    pub fn load() -> Result<Self> {
        Self::load_with_base(None)
    }

    /// Load paths from environment variables, resolving relative ones
    /// against `base_dir` (the current directory when `None`). A `.env`
    /// file in the current directory is read first.
    pub fn load_with_base(base_dir: Option<PathBuf>) -> Result<Self> {
        let base = match base_dir {
            Some(base) => base,
            None => {
                let cwd = env::current_dir().context("Failed to get current directory")?;
                let env_file = cwd.join(".env");
                if env_file.exists() {
                    dotenv::from_path(&env_file).ok();
                }
                cwd
            }
        };

        let data_path = Self::get_path_from_env("DATA_PATH", "./data", &base);
        let database_path = match env::var("DATABASE_PATH") {
            Ok(path) => Self::resolve(PathBuf::from(path), &base),
            Err(_) => data_path.join("showcase.db"),
        };
        let uploads_path = match env::var("UPLOADS_PATH") {
            Ok(path) => Self::resolve(PathBuf::from(path), &base),
            Err(_) => data_path.join("uploads"),
        };

        Ok(Self {
            data_path,
            database_path,
            uploads_path,
        })
    }

    /// Replace the database file, as given by `--database`.
    pub fn with_database_path(mut self, path: PathBuf) -> Self {
        self.database_path = path;
        self
    }

    fn get_path_from_env(var_name: &str, default: &str, base_dir: &Path) -> PathBuf {
        let path = env::var(var_name).unwrap_or_else(|_| default.to_string());
        Self::resolve(PathBuf::from(path), base_dir)
    }

    fn resolve(path: PathBuf, base_dir: &Path) -> PathBuf {
        if path.is_relative() {
            base_dir.join(path)
        } else {
            path
        }
    }

    /// Get the logs directory path
    pub fn logs_path(&self) -> PathBuf {
        self.data_path.join("logs")
    }
}

/// Get the current environment (dev, test, prd)
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string())
}
