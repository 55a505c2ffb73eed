use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "sqlite://events.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_EMAIL: &str = "admin@localhost";
const DEFAULT_UPLOAD_DIR: &str = "static/uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 4 * 1024 * 1024;
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: &'static str, message: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Credentials of the account whose events every viewer can see.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub username: String,
    pub email: String,
    /// Only consulted when the account has to be created.
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub port: u16,
    pub admin: AdminConfig,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub session_ttl: Duration,
    pub allowed_origins: Vec<String>,
    pub production: bool,
    pub seed_demo_events: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let admin = AdminConfig {
            username: env_or("ADMIN_USERNAME", DEFAULT_ADMIN_USERNAME),
            email: env_or("ADMIN_EMAIL", DEFAULT_ADMIN_EMAIL),
            password: env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
        };

        let config = Self {
            database_url: env_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            max_connections: parse_env("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            port: parse_env("PORT", DEFAULT_PORT)?,
            admin,
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", DEFAULT_UPLOAD_DIR)),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            session_ttl: Duration::from_secs(parse_env(
                "SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL_SECS,
            )?),
            allowed_origins: split_origins(&env_or("CORS_ALLOWED_ORIGINS", DEFAULT_ALLOWED_ORIGINS)),
            production: env::var("RUST_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            seed_demo_events: env::var("SEED_DEMO_EVENTS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    /// Settings suitable for tests and local tooling: in-memory database,
    /// development mode.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 1,
            port: DEFAULT_PORT,
            admin: AdminConfig {
                username: DEFAULT_ADMIN_USERNAME.to_string(),
                email: DEFAULT_ADMIN_EMAIL.to_string(),
                password: None,
            },
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            allowed_origins: split_origins(DEFAULT_ALLOWED_ORIGINS),
            production: false,
            seed_demo_events: false,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.admin.username.trim().is_empty() {
            return Err(ConfigError::Empty("ADMIN_USERNAME"));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                var: "DATABASE_MAX_CONNECTIONS",
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                var: "MAX_UPLOAD_BYTES",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn env_or(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                var,
                message: e.to_string(),
            }),
        Err(_) => Ok(default),
    }
}

pub(crate) fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_origins_skips_blanks() {
        let origins = split_origins(" http://a.test , ,http://b.test,");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn for_database_defaults_to_development_mode() {
        let config = Config::for_database("sqlite::memory:");
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.max_upload_bytes, 4 * 1024 * 1024);
        assert!(!config.production);
        assert!(config.admin.password.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_admin_username() {
        let mut config = Config::for_database("sqlite::memory:");
        config.admin.username = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Empty("ADMIN_USERNAME"))
        ));
    }
}
