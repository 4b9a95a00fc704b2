//! Database pool bootstrap

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::DatabaseConfig;

/// Connect to Postgres, retrying until it answers or the process is interrupted
pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let retry = Duration::from_millis(config.retry_interval_ms);
    let mut attempt = 1u32;

    loop {
        match PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await
        {
            Ok(pool) => {
                tracing::info!("Connected to database after {} attempt(s)", attempt);
                return Ok(pool);
            }
            Err(e) => {
                tracing::warn!("Database connection attempt {} failed: {}", attempt, e);
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(retry) => {}
            _ = tokio::signal::ctrl_c() => {
                anyhow::bail!("interrupted while waiting for the database");
            }
        }
        attempt += 1;
    }
}

/// Apply pending migrations
pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

/// `SELECT 1` bounded by `timeout`
pub async fn ping(pool: &PgPool, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, sqlx::query("SELECT 1").execute(pool)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            tracing::warn!("Database ping failed: {}", e);
            false
        }
        Err(_) => {
            tracing::warn!("Database ping timed out after {:?}", timeout);
            false
        }
    }
}
