//! Database layer - connection pool, migrations and Postgres stores
//!
//! # Design Principles
//!
//! - One pool per process, owned by [`Connector`] and injected into stores
//! - Reply trees are fetched level by level with `= ANY($1)`, no N+1
//! - Transactions for multi-record mutations
//! - Every operation is bounded by the configured timeout

pub mod migrations;
pub mod pool;
pub mod repos;

use std::future::Future;
use std::time::Duration;

pub use pool::Connector;
pub use repos::{PgCommunityStore, PgThreadStore, PgUserStore};

use crate::error::StoreError;

/// Whether an operation reads or writes, for error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpKind {
    Read,
    Write,
}

/// Classify a driver error, logging the original.
pub(crate) fn store_error(kind: OpKind, op: &'static str, e: sqlx::Error) -> StoreError {
    tracing::error!(op, error = %e, "Database operation failed");
    match e {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Connectivity(e.to_string()),
        _ => match kind {
            OpKind::Read => StoreError::Read(e.to_string()),
            OpKind::Write => StoreError::Write(e.to_string()),
        },
    }
}

/// Run a store operation under a timeout.
///
/// Elapsed operations surface as a read or write error; a timed-out
/// transaction is dropped, which rolls it back.
pub(crate) async fn bounded<T, F>(
    limit: Duration,
    kind: OpKind,
    op: &'static str,
    fut: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(op, timeout_ms = limit.as_millis() as u64, "Database operation timed out");
            let msg = format!("{} timed out after {}ms", op, limit.as_millis());
            Err(match kind {
                OpKind::Read => StoreError::Read(msg),
                OpKind::Write => StoreError::Write(msg),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn timeout_maps_to_operation_kind() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, StoreError>(())
        };
        let err = bounded(Duration::from_millis(10), OpKind::Write, "create thread", slow)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Write("create thread timed out after 10ms".into())
        );
    }

    #[tokio::test]
    async fn fast_operation_passes_through() {
        let value = bounded(Duration::from_secs(1), OpKind::Read, "noop", async {
            Ok::<_, StoreError>(7)
        })
        .await
        .unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn pool_timeout_is_connectivity() {
        let err = store_error(OpKind::Read, "fetch feed", sqlx::Error::PoolTimedOut);
        assert!(err.is_connectivity());

        let err = store_error(OpKind::Write, "create thread", sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Write(_)));
    }
}
