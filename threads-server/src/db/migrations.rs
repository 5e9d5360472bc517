//! Schema migrations
//!
//! Idempotent: every statement is `IF NOT EXISTS`, so this runs on each
//! startup and from `threads migrate`.

use sqlx::PgPool;

use super::{store_error, OpKind};
use crate::error::StoreError;

/// Run all migrations
pub async fn run(pool: &PgPool) -> Result<(), StoreError> {
    tracing::info!("Running migrations...");

    for statement in TABLES.iter().chain(INDEXES) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| store_error(OpKind::Write, "migrate", e))?;
    }

    tracing::info!("Migrations complete");
    Ok(())
}

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        external_id TEXT NOT NULL UNIQUE,
        username TEXT NOT NULL CHECK (username = lower(username)),
        name TEXT NOT NULL,
        bio TEXT NOT NULL DEFAULT '',
        image TEXT NOT NULL DEFAULT '',
        onboarded BOOLEAN NOT NULL DEFAULT FALSE,
        threads UUID[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS communities (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        external_id TEXT NOT NULL UNIQUE,
        username TEXT NOT NULL CHECK (username = lower(username)),
        name TEXT NOT NULL,
        bio TEXT NOT NULL DEFAULT '',
        image TEXT NOT NULL DEFAULT '',
        threads UUID[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS threads (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        text TEXT NOT NULL,
        author_id UUID NOT NULL REFERENCES users(id),
        parent_id UUID REFERENCES threads(id),
        community_id UUID REFERENCES communities(id),
        children UUID[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
    )
    "#,
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_users_created ON users(created_at)",
    // Feed: top-level posts, newest first
    "CREATE INDEX IF NOT EXISTS idx_threads_feed ON threads(created_at DESC) WHERE parent_id IS NULL",
    "CREATE INDEX IF NOT EXISTS idx_threads_parent ON threads(parent_id)",
    "CREATE INDEX IF NOT EXISTS idx_threads_author ON threads(author_id)",
];
