//! Database migration command.
//!
//! Applies every migration in `crates/api/migrations/` that has not been
//! applied yet. Safe to run repeatedly.

use super::{CliError, connect};

/// Run pending migrations.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
