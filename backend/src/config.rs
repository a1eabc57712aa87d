//! Server configuration from command-line flags and environment variables.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

use crate::domain::passwords;

/// Deployment environment; controls CORS
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    /// Only the local dev servers may call the API cross-origin
    Development,
    /// Any origin may call the API
    Production,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "budget-server", version, about = "REST backend for the personal budget application")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "BUDGET_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// SQLite database URL; the file is created if missing
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:budget.db")]
    pub database_url: String,

    /// Expected value of the X-API-Key header
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long = "environment", env = "ENV", value_enum, ignore_case = true, default_value = "production")]
    pub environment: Environment,

    /// Secret for signing bearer tokens and download links. A random one is
    /// generated when unset, which signs everyone out on restart.
    #[arg(long, env = "JWT_SECRET_KEY", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Directory holding database backups
    #[arg(long, env = "BACKUP_DIR", default_value = "data/backups")]
    pub backup_dir: PathBuf,

    /// Seed default categories, periods, income types and the current month
    #[arg(long, env = "BUDGET_SEED")]
    pub seed: bool,

    /// Administrator account created or promoted at startup
    #[arg(long, env = "ADMIN_EMAIL", requires = "admin_password")]
    pub admin_email: Option<String>,

    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true, requires = "admin_email")]
    pub admin_password: Option<String>,

    /// Tracing filter, e.g. "info" or "budget_backend=debug,tower_http=info"
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Origins allowed to make cross-origin requests in development
    pub const DEV_ORIGINS: [&'static str; 2] = ["http://localhost:3000", "http://localhost:5173"];
}

/// Settings the HTTP layer needs at request time
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub api_key: Option<String>,
    pub environment: Environment,
    pub jwt_secret: String,
    pub backup_dir: PathBuf,
}

impl From<&Config> for ApiSettings {
    fn from(config: &Config) -> Self {
        let jwt_secret = match &config.jwt_secret {
            Some(secret) => secret.clone(),
            None => {
                warn!("JWT_SECRET_KEY not set; using a random secret for this run");
                passwords::random_token()
            }
        };

        Self {
            api_key: config.api_key.clone(),
            environment: config.environment,
            jwt_secret,
            backup_dir: config.backup_dir.clone(),
        }
    }
}
