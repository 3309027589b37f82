//! # Database Pool
//!
//! SeaORM connection pool setup. Postgres in deployment, in-memory SQLite
//! in tests; both go through the same `ConnectOptions`. Startup retries
//! transient connection failures with exponential backoff so the service
//! survives a database that is still coming up.

use std::time::Duration;

use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use thiserror::Error;
use tokio::time::sleep;

use crate::config::AppConfig;

const MAX_CONNECT_ATTEMPTS: u32 = 5;
const FIRST_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Errors raised while opening the connection pool
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database URL is empty")]
    MissingUrl,
    #[error("could not connect after {attempts} attempts: {source}")]
    ConnectFailed {
        attempts: u32,
        source: sea_orm::DbErr,
    },
}

/// Open the connection pool described by the configuration.
pub async fn init_pool(cfg: &AppConfig) -> Result<DatabaseConnection> {
    if cfg.database_url.is_empty() {
        return Err(DatabaseError::MissingUrl.into());
    }

    let mut options = ConnectOptions::new(&cfg.database_url);
    options
        .max_connections(cfg.db_max_connections)
        .acquire_timeout(Duration::from_millis(cfg.db_acquire_timeout_ms))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let mut delay = FIRST_RETRY_DELAY;
    let mut attempt = 1;
    loop {
        match Database::connect(options.clone()).await {
            Ok(pool) => {
                tracing::info!(attempt, "database pool ready");
                return Ok(pool);
            }
            Err(error) if attempt < MAX_CONNECT_ATTEMPTS => {
                tracing::warn!(
                    attempt,
                    error = %error,
                    retry_in_ms = delay.as_millis() as u64,
                    "database connection failed, retrying"
                );
                sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(source) => {
                return Err(DatabaseError::ConnectFailed {
                    attempts: attempt,
                    source,
                }
                .into());
            }
        }
    }
}

/// Ping the database with a trivial query.
pub async fn health_check(db: &DatabaseConnection) -> Result<()> {
    let ping = Statement::from_string(db.get_database_backend(), "SELECT 1".to_string());
    db.query_one(ping).await.context("database ping failed")?;
    Ok(())
}
