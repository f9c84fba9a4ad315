//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LITTLE_LEMON_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`). Not needed when `LITTLE_LEMON_STORE=memory`.
//!
//! ## Optional
//! - `LITTLE_LEMON_STORE` - `postgres` (default) or `memory`
//! - `LITTLE_LEMON_HOST` - Bind address (default: 127.0.0.1)
//! - `LITTLE_LEMON_PORT` - Listen port (default: 8000)
//! - `LITTLE_LEMON_PAGE_SIZE` - Default entries per page (default: 10)
//! - `LITTLE_LEMON_MAX_PAGE_SIZE` - Largest `perpage` a client may ask for (default: 100)
//! - `LITTLE_LEMON_ANON_THROTTLE_PER_MINUTE` - Anonymous requests per minute per IP (default: 30)
//! - `LITTLE_LEMON_USER_THROTTLE_PER_MINUTE` - Authenticated requests per minute per token (default: 120)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which persistence backend to run against.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// `PostgreSQL` at the given URL.
    Postgres(SecretString),
    /// In-process store; state is lost on restart.
    Memory,
}

/// Request throttling quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Requests per minute for callers without a token, keyed by client IP.
    pub anon_per_minute: NonZeroU32,
    /// Requests per minute for authenticated callers, keyed by token.
    pub user_per_minute: NonZeroU32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            anon_per_minute: NonZeroU32::new(30).unwrap_or(NonZeroU32::MIN),
            user_per_minute: NonZeroU32::new(120).unwrap_or(NonZeroU32::MIN),
        }
    }
}

/// Pagination defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingConfig {
    /// Entries per page when the client does not say.
    pub page_size: u32,
    /// Upper bound on a client-requested page size.
    pub max_page_size: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            max_page_size: 100,
        }
    }
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Persistence backend
    pub store: StoreBackend,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Pagination defaults
    pub paging: PagingConfig,
    /// Throttle quotas
    pub throttle: ThrottleConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let store = match get_env_or_default("LITTLE_LEMON_STORE", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres(get_database_url("LITTLE_LEMON_DATABASE_URL")?),
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "LITTLE_LEMON_STORE".to_string(),
                    format!("expected 'postgres' or 'memory', got '{other}'"),
                ));
            }
        };

        let host = get_parsed_env::<IpAddr>("LITTLE_LEMON_HOST", "127.0.0.1")?;
        let port = get_parsed_env::<u16>("LITTLE_LEMON_PORT", "8000")?;

        let paging = PagingConfig {
            page_size: get_parsed_env::<NonZeroU32>("LITTLE_LEMON_PAGE_SIZE", "10")?.get(),
            max_page_size: get_parsed_env::<NonZeroU32>("LITTLE_LEMON_MAX_PAGE_SIZE", "100")?
                .get(),
        };

        let throttle = ThrottleConfig {
            anon_per_minute: get_parsed_env("LITTLE_LEMON_ANON_THROTTLE_PER_MINUTE", "30")?,
            user_per_minute: get_parsed_env("LITTLE_LEMON_USER_THROTTLE_PER_MINUTE", "120")?,
        };

        Ok(Self {
            store,
            host,
            port,
            paging,
            throttle,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration for an in-memory instance, as used by tests and demos.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: StoreBackend::Memory,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8000,
            paging: PagingConfig::default(),
            throttle: ThrottleConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get and parse an environment variable, falling back to `default`.
fn get_parsed_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_ok() {
        let port: u16 = parse_value("PORT", " 8080 ").unwrap();
        assert_eq!(port, 8080);

        let host: IpAddr = parse_value("HOST", "0.0.0.0").unwrap();
        assert_eq!(host, IpAddr::from([0, 0, 0, 0]));
    }

    #[test]
    fn test_parse_value_invalid() {
        let err = parse_value::<u16>("LITTLE_LEMON_PORT", "eighty").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "LITTLE_LEMON_PORT"));
    }

    #[test]
    fn test_zero_throttle_rejected() {
        assert!(parse_value::<NonZeroU32>("RATE", "0").is_err());
    }

    #[test]
    fn test_defaults() {
        let throttle = ThrottleConfig::default();
        assert_eq!(throttle.anon_per_minute.get(), 30);
        assert_eq!(throttle.user_per_minute.get(), 120);

        let config = ApiConfig::in_memory();
        assert!(matches!(config.store, StoreBackend::Memory));
        assert_eq!(config.paging.page_size, 10);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8000");
    }
}
