//! Database connection management
//!
//! [`Connector`] owns the process's single Postgres pool. The pool is
//! established lazily on first use; concurrent first callers share one
//! in-flight connect.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::OnceCell;

use crate::config::StoreConfig;
use crate::error::StoreError;

/// Owner of the connection pool
#[derive(Debug)]
pub struct Connector {
    target: Option<String>,
    max_connections: u32,
    acquire_timeout: Duration,
    pool: OnceCell<PgPool>,
}

impl Connector {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            target: config.database_url.clone(),
            max_connections: config.max_connections,
            acquire_timeout: config.op_timeout,
            pool: OnceCell::new(),
        }
    }

    /// Whether a connection target is configured at all.
    pub fn is_configured(&self) -> bool {
        self.target.is_some()
    }

    /// Whether a pool has been established.
    pub fn is_connected(&self) -> bool {
        self.pool.initialized()
    }

    /// Get the pool, connecting first if needed.
    ///
    /// Idempotent: once connected, further calls return the same pool.
    /// A failed attempt leaves the connector unconnected so the next
    /// call tries again.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotConfigured`] without a connection target
    /// - [`StoreError::Connectivity`] if the connect fails
    pub async fn connect(&self) -> Result<&PgPool, StoreError> {
        let Some(target) = self.target.as_deref() else {
            return Err(StoreError::NotConfigured);
        };

        self.pool
            .get_or_try_init(|| async {
                tracing::info!(
                    max_connections = self.max_connections,
                    "Connecting to database"
                );
                PgPoolOptions::new()
                    .max_connections(self.max_connections)
                    .acquire_timeout(self.acquire_timeout)
                    .connect(target)
                    .await
                    .map_err(|e| {
                        tracing::error!(error = %e, "Database connection failed");
                        StoreError::Connectivity(e.to_string())
                    })
            })
            .await
    }

    /// Ping the database through the pool.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        let pool = self.connect().await?;
        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Database health check failed");
                StoreError::Connectivity(e.to_string())
            })?;
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            tracing::info!("Closing database pool");
            pool.close().await;
        }
    }
}
