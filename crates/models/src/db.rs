//! Connection pool lifecycle.
//!
//! The pool is created lazily: no connection is opened until the first
//! query, so an unreachable database never blocks startup. Connections are
//! lent per statement and returned to the pool when the statement finishes,
//! on success and on error alike.

use std::time::Duration;

use configs::{DatabaseConfig, StoreConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::{debug, info};

use crate::errors::ModelError;

pub fn connect_options(cfg: &DatabaseConfig) -> Result<ConnectOptions, ModelError> {
    let url = cfg.connection_url().map_err(|e| ModelError::Validation(e.to_string()))?;
    let mut opt = ConnectOptions::new(url);
    opt.max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(cfg.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(cfg.max_lifetime_secs))
        // drop broken connections instead of handing them out
        .test_before_acquire(true)
        .connect_lazy(true)
        .sqlx_logging(cfg.sqlx_logging)
        .sqlx_logging_level(log::LevelFilter::Debug);
    Ok(opt)
}

/// Open a bounded pool for the given settings.
pub async fn connect_with_config(cfg: &DatabaseConfig) -> Result<DatabaseConnection, ModelError> {
    cfg.validate().map_err(|e| ModelError::Validation(e.to_string()))?;
    let opt = connect_options(cfg)?;
    let db = Database::connect(opt).await?;
    info!(
        host = %cfg.host,
        port = cfg.port,
        database = %cfg.database,
        ssl = cfg.ssl,
        max_connections = cfg.max_connections,
        "database pool opened"
    );
    Ok(db)
}

/// Open a pool from `config.toml` / `DATABASE_URL`.
pub async fn connect() -> Result<DatabaseConnection, ModelError> {
    let cfg = StoreConfig::load_and_validate().map_err(|e| ModelError::Validation(e.to_string()))?;
    connect_with_config(&cfg.database).await
}

/// Drain and close the pool.
///
/// Waits for lent connections to come back; later acquisitions through any
/// handle to the same pool fail with a pool-closed error.
pub async fn close(db: &DatabaseConnection) {
    match db {
        DatabaseConnection::SqlxPostgresPoolConnection(_) => {
            db.get_postgres_connection_pool().close().await;
            info!("database pool closed");
        }
        _ => debug!("no pooled connection to close"),
    }
}
