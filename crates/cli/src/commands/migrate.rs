//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! cw-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CARTWHEEL_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! Application tables live in `crates/server/migrations/`. The session table
//! is created by `tower-sessions-sqlx-store` in the `tower_sessions` schema.

use cartwheel_server::db::create_pool;
use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, database_url};

/// Run application and session store migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running application migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Running session store migrations...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
