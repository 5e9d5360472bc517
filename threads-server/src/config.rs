//! Store configuration - environment loading
//!
//! Configuration is loaded from environment variables:
//! - `DATABASE_URL`: Postgres connection string (unset = in-process store)
//! - `THREADS_MAX_CONNECTIONS`: pool size (default: 5)
//! - `THREADS_STORE_TIMEOUT_MS`: per-operation timeout (default: 5000)

use std::time::Duration;

/// Default maximum connections for the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default bound on a single store operation.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(5);

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Postgres connection string; `None` disables persistence
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Bound on each store operation, including pool acquisition
    pub op_timeout: Duration,
}

impl StoreConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        if database_url.is_none() {
            tracing::warn!("DATABASE_URL not set, persistence disabled");
        }

        Self {
            database_url,
            max_connections: env_parse("THREADS_MAX_CONNECTIONS")
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            op_timeout: env_parse("THREADS_STORE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_OP_TIMEOUT),
        }
    }

    /// Config pointing at an explicit database (for testing)
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            database_url: Some(url.into()),
            ..Self::default()
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "invalid value, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StoreConfig::default();
        assert!(config.database_url.is_none());
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.op_timeout, Duration::from_secs(5));
    }

    #[test]
    fn with_url_keeps_defaults() {
        let config = StoreConfig::with_url("postgres://localhost/threads");
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/threads")
        );
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
    }
}
