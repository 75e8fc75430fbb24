//! SQLite persistence layer: connection pool, migrations, models, and
//! repositories.
//!
//! Repositories are the single write path for all entities. The engine and
//! any presentation layer request mutations through them instead of touching
//! rows directly, which keeps concurrent download completions from
//! interleaving writes into the pin/photo graph.

pub mod models;
pub mod repositories;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// Shared connection pool alias used across the workspace.
pub type DbPool = sqlx::SqlitePool;

/// Embedded migrations, applied by [`connect`] and by the test harness.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Open a pool for `database_url` (e.g. `sqlite://waypoint.db`), creating
/// the file if missing, and bring the schema up to date.
pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;

    tracing::info!(database_url, "Database ready");
    Ok(pool)
}
