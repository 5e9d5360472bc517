//! User repository
//!
//! - upsert: INSERT ... ON CONFLICT (external_id) DO UPDATE
//! - search: window function for the total, single query

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Row};
use uuid::Uuid;

use crate::db::{bounded, store_error, Connector, OpKind};
use crate::error::StoreError;
use crate::models::{Paginated, ProfileUpdate, User, UserQuery};
use crate::store::UserStore;

const USER_COLUMNS: &str =
    "id, external_id, username, name, bio, image, onboarded, threads, created_at";

/// User row from database
#[derive(Debug, Clone, FromRow)]
struct UserRow {
    id: Uuid,
    external_id: String,
    username: String,
    name: String,
    bio: String,
    image: String,
    onboarded: bool,
    threads: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            external_id: r.external_id,
            username: r.username,
            name: r.name,
            bio: r.bio,
            image: r.image,
            onboarded: r.onboarded,
            threads: r.threads,
            created_at: r.created_at,
        }
    }
}

/// Postgres-backed User Directory
#[derive(Debug, Clone)]
pub struct PgUserStore {
    connector: Arc<Connector>,
    op_timeout: Duration,
}

impl PgUserStore {
    pub fn new(connector: Arc<Connector>, op_timeout: Duration) -> Self {
        Self {
            connector,
            op_timeout,
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn upsert_profile(&self, update: &ProfileUpdate) -> Result<User, StoreError> {
        bounded(self.op_timeout, OpKind::Write, "upsert user", async {
            let pool = self.connector.connect().await?;

            let row: Option<UserRow> = sqlx::query_as(&format!(
                r#"
                INSERT INTO users (external_id, username, name, bio, image, onboarded)
                VALUES ($1, $2, $3, $4, $5, TRUE)
                ON CONFLICT (external_id) DO UPDATE SET
                    username = EXCLUDED.username,
                    name = EXCLUDED.name,
                    bio = EXCLUDED.bio,
                    image = EXCLUDED.image,
                    onboarded = TRUE
                RETURNING {USER_COLUMNS}
                "#
            ))
            .bind(&update.identity)
            .bind(update.username.as_str())
            .bind(update.name.as_str())
            .bind(update.bio.as_str())
            .bind(update.image.as_str())
            .fetch_optional(pool)
            .await
            .map_err(|e| store_error(OpKind::Write, "upsert user", e))?;

            row.map(User::from).ok_or_else(|| {
                StoreError::Write(format!(
                    "user '{}' not found or could not be updated",
                    update.identity
                ))
            })
        })
        .await
    }

    async fn get_by_identity(&self, identity: &str) -> Result<Option<User>, StoreError> {
        bounded(self.op_timeout, OpKind::Read, "fetch user", async {
            let pool = self.connector.connect().await?;

            let row: Option<UserRow> = sqlx::query_as(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE external_id = $1"
            ))
            .bind(identity)
            .fetch_optional(pool)
            .await
            .map_err(|e| store_error(OpKind::Read, "fetch user", e))?;

            Ok(row.map(User::from))
        })
        .await
    }

    async fn search(&self, query: &UserQuery) -> Result<Paginated<User>, StoreError> {
        bounded(self.op_timeout, OpKind::Read, "search users", async {
            let pool = self.connector.connect().await?;

            // strpos over lower() keeps the search text literal (no LIKE
            // wildcards). Sort direction comes from an enum, not user input.
            let filter = r#"
                WHERE external_id <> $1
                AND (trim($2) = '' OR strpos(lower(username), lower($2)) > 0
                             OR strpos(lower(name), lower($2)) > 0)
            "#;

            let rows = sqlx::query(&format!(
                r#"
                SELECT {USER_COLUMNS}, COUNT(*) OVER() AS total
                FROM users
                {filter}
                ORDER BY created_at {dir}, id {dir}
                LIMIT $3 OFFSET $4
                "#,
                dir = query.sort.as_sql(),
            ))
            .bind(&query.exclude)
            .bind(&query.text)
            .bind(query.page.limit() as i64)
            .bind(query.page.offset() as i64)
            .fetch_all(pool)
            .await
            .map_err(|e| store_error(OpKind::Read, "search users", e))?;

            let total = match rows.first() {
                Some(r) => r
                    .try_get::<i64, _>("total")
                    .map_err(|e| store_error(OpKind::Read, "search users", e))?,
                // Past the last page the window count is unavailable
                None if query.page.offset() > 0 => {
                    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM users {filter}"))
                        .bind(&query.exclude)
                        .bind(&query.text)
                        .fetch_one(pool)
                        .await
                        .map_err(|e| store_error(OpKind::Read, "count users", e))?
                }
                None => 0,
            };

            let items = rows
                .iter()
                .map(|r| UserRow::from_row(r).map(User::from))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| store_error(OpKind::Read, "search users", e))?;

            Ok(Paginated::new(items, total, query.page))
        })
        .await
    }
}
