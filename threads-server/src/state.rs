//! Application state shared across handlers

use std::sync::Arc;

use crate::actions::Actions;
use crate::config::StoreConfig;
use crate::db::{migrations, Connector, PgCommunityStore, PgThreadStore, PgUserStore};
use crate::error::StoreError;
use crate::revalidate::Revalidator;
use crate::store::MemoryStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    actions: Actions,
    /// Present when backed by Postgres
    connector: Option<Arc<Connector>>,
}

impl AppState {
    /// State backed by an in-process store.
    pub fn in_memory(store: MemoryStore, revalidator: Arc<dyn Revalidator>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                actions: Actions::in_memory(store, revalidator),
                connector: None,
            }),
        }
    }

    /// Connect to Postgres and run migrations, or fall back to an
    /// in-process store when no database is configured.
    pub async fn from_config(
        config: &StoreConfig,
        revalidator: Arc<dyn Revalidator>,
    ) -> Result<Self, StoreError> {
        let connector = Arc::new(Connector::new(config));
        if !connector.is_configured() {
            tracing::warn!("No database configured, using in-process store");
            return Ok(Self::in_memory(MemoryStore::new(), revalidator));
        }

        migrations::run(connector.connect().await?).await?;

        let actions = Actions::new(
            Arc::new(PgUserStore::new(connector.clone(), config.op_timeout)),
            Arc::new(PgCommunityStore::new(connector.clone(), config.op_timeout)),
            Arc::new(PgThreadStore::new(connector.clone(), config.op_timeout)),
            revalidator,
        );
        Ok(Self {
            inner: Arc::new(AppStateInner {
                actions,
                connector: Some(connector),
            }),
        })
    }

    pub fn actions(&self) -> &Actions {
        &self.inner.actions
    }

    /// Name of the backing store, for health reporting.
    pub fn store_kind(&self) -> &'static str {
        if self.inner.connector.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }

    /// Check the backing store is reachable.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        match &self.inner.connector {
            Some(connector) => connector.health_check().await,
            None => Ok(()),
        }
    }

    /// Release the connection pool, if any.
    pub async fn close(&self) {
        if let Some(connector) = &self.inner.connector {
            connector.close().await;
        }
    }
}
