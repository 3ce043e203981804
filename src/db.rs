use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Open the SQLite pool and bring the schema up to date.
///
/// Creates the database file (and its directory) on first start.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, anyhow::Error> {
    if let Some(path) = database_url.strip_prefix("sqlite://")
        && !path.starts_with(":memory:")
        && let Some(parent) = std::path::Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;

    sqlx::migrate!().run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}
