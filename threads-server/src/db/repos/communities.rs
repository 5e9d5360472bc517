//! Community repository

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::db::{bounded, store_error, Connector, OpKind};
use crate::error::StoreError;
use crate::models::{Community, CommunityUpdate};
use crate::store::CommunityStore;

const COMMUNITY_COLUMNS: &str = "id, external_id, username, name, bio, image, threads, created_at";

#[derive(Debug, Clone, FromRow)]
struct CommunityRow {
    id: Uuid,
    external_id: String,
    username: String,
    name: String,
    bio: String,
    image: String,
    threads: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<CommunityRow> for Community {
    fn from(r: CommunityRow) -> Self {
        Self {
            id: r.id,
            external_id: r.external_id,
            username: r.username,
            name: r.name,
            bio: r.bio,
            image: r.image,
            threads: r.threads,
            created_at: r.created_at,
        }
    }
}

/// Postgres-backed Community Directory
#[derive(Debug, Clone)]
pub struct PgCommunityStore {
    connector: Arc<Connector>,
    op_timeout: Duration,
}

impl PgCommunityStore {
    pub fn new(connector: Arc<Connector>, op_timeout: Duration) -> Self {
        Self {
            connector,
            op_timeout,
        }
    }
}

#[async_trait]
impl CommunityStore for PgCommunityStore {
    async fn upsert(&self, update: &CommunityUpdate) -> Result<Community, StoreError> {
        bounded(self.op_timeout, OpKind::Write, "upsert community", async {
            let pool = self.connector.connect().await?;

            let row: CommunityRow = sqlx::query_as(&format!(
                r#"
                INSERT INTO communities (external_id, username, name, bio, image)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (external_id) DO UPDATE SET
                    username = EXCLUDED.username,
                    name = EXCLUDED.name,
                    bio = EXCLUDED.bio,
                    image = EXCLUDED.image
                RETURNING {COMMUNITY_COLUMNS}
                "#
            ))
            .bind(&update.external_id)
            .bind(update.username.as_str())
            .bind(update.name.as_str())
            .bind(update.bio.as_str())
            .bind(update.image.as_str())
            .fetch_one(pool)
            .await
            .map_err(|e| store_error(OpKind::Write, "upsert community", e))?;

            Ok(row.into())
        })
        .await
    }

    async fn get_by_external_id(&self, external_id: &str) -> Result<Option<Community>, StoreError> {
        bounded(self.op_timeout, OpKind::Read, "fetch community", async {
            let pool = self.connector.connect().await?;

            let row: Option<CommunityRow> = sqlx::query_as(&format!(
                "SELECT {COMMUNITY_COLUMNS} FROM communities WHERE external_id = $1"
            ))
            .bind(external_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| store_error(OpKind::Read, "fetch community", e))?;

            Ok(row.map(Community::from))
        })
        .await
    }
}
