//! Subcommand implementations.
//!
//! # Environment Variables
//!
//! - `LITTLE_LEMON_DATABASE_URL` - `PostgreSQL` connection string (falls back
//!   to `DATABASE_URL`)

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use little_lemon_api::db::{self, RepositoryError};
use little_lemon_api::services::AuthError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Store operation failed.
    #[error("Store error: {0}")]
    Repository(#[from] RepositoryError),

    /// Account creation failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Unknown staff group.
    #[error("Invalid group: {0}. Valid groups: manager, delivery-crew")]
    InvalidGroup(String),

    /// Built-in seed data failed validation.
    #[error("Invalid seed data: {0}")]
    Seed(String),

    /// No user with that username.
    #[error("No user named {0}")]
    UnknownUser(String),
}

/// Connect to the database named by the environment.
async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("LITTLE_LEMON_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("LITTLE_LEMON_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}
