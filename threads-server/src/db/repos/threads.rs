//! Thread repository
//!
//! Handles thread CRUD with:
//! - Atomic creation, linking the thread to its author and community
//! - Atomic replies, linking the reply into the parent's children
//! - Paginated feed of top-level posts
//! - Reply trees joined level by level, bounded at two levels

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use crate::db::{bounded, store_error, Connector, OpKind};
use crate::error::StoreError;
use crate::models::{
    Author, CommunitySummary, NewReply, NewThread, Paginated, Pagination, Thread, ThreadNode,
    UserPosts,
};
use crate::store::ThreadStore;

/// Columns for a thread joined with its author and community.
const NODE_SELECT: &str = r#"
    SELECT
        t.id,
        t.text,
        t.parent_id,
        t.children,
        t.created_at,
        u.external_id AS author_id,
        u.name AS author_name,
        u.username AS author_username,
        u.image AS author_image,
        c.external_id AS community_id,
        c.name AS community_name,
        c.image AS community_image
    FROM threads t
    JOIN users u ON u.id = t.author_id
    LEFT JOIN communities c ON c.id = t.community_id
"#;

/// Thread joined with author and community
#[derive(Debug, Clone, FromRow)]
struct NodeRow {
    id: Uuid,
    text: String,
    parent_id: Option<Uuid>,
    children: Vec<Uuid>,
    created_at: DateTime<Utc>,
    author_id: String,
    author_name: String,
    author_username: String,
    author_image: String,
    community_id: Option<String>,
    community_name: Option<String>,
    community_image: Option<String>,
}

impl NodeRow {
    /// Convert to a node, attaching replies from `level` in child-list order.
    fn into_node(self, level: &mut HashMap<Uuid, ThreadNode>) -> ThreadNode {
        let replies = self
            .children
            .iter()
            .filter_map(|id| level.remove(id))
            .collect();

        let community = match (self.community_id, self.community_name) {
            (Some(id), Some(name)) => Some(CommunitySummary {
                id,
                name,
                image: self.community_image.unwrap_or_default(),
            }),
            _ => None,
        };

        ThreadNode {
            id: self.id,
            text: self.text,
            author: Author {
                id: self.author_id,
                name: self.author_name,
                username: self.author_username,
                image: self.author_image,
            },
            parent_id: self.parent_id,
            community,
            created_at: self.created_at,
            reply_count: self.children.len(),
            replies,
        }
    }
}

/// Thread row as stored
#[derive(Debug, Clone, FromRow)]
struct ThreadRow {
    id: Uuid,
    text: String,
    parent_id: Option<Uuid>,
    community_id: Option<Uuid>,
    children: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl ThreadRow {
    fn with_author(self, author: &str) -> Thread {
        Thread {
            id: self.id,
            text: self.text,
            author: author.to_owned(),
            parent_id: self.parent_id,
            community_id: self.community_id,
            children: self.children,
            created_at: self.created_at,
        }
    }
}

/// Postgres-backed Thread Store
#[derive(Debug, Clone)]
pub struct PgThreadStore {
    connector: Arc<Connector>,
    op_timeout: Duration,
}

impl PgThreadStore {
    pub fn new(connector: Arc<Connector>, op_timeout: Duration) -> Self {
        Self {
            connector,
            op_timeout,
        }
    }
}

/// Fetch nodes by id, in no particular order.
async fn fetch_nodes(
    pool: &PgPool,
    ids: &[Uuid],
    op: &'static str,
) -> Result<Vec<NodeRow>, StoreError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as(&format!("{NODE_SELECT} WHERE t.id = ANY($1)"))
        .bind(ids)
        .fetch_all(pool)
        .await
        .map_err(|e| store_error(OpKind::Read, op, e))
}

/// Fetch the children of `parents` as finished leaf nodes (no replies
/// attached), keyed by id.
async fn fetch_leaf_level(
    pool: &PgPool,
    parents: &[NodeRow],
    op: &'static str,
) -> Result<HashMap<Uuid, ThreadNode>, StoreError> {
    let ids: Vec<Uuid> = parents.iter().flat_map(|p| p.children.iter().copied()).collect();
    let rows = fetch_nodes(pool, &ids, op).await?;

    let mut none = HashMap::new();
    Ok(rows
        .into_iter()
        .map(|r| (r.id, r.into_node(&mut none)))
        .collect())
}

/// Attach one level of replies to each row, preserving `rows` order.
async fn with_replies(
    pool: &PgPool,
    rows: Vec<NodeRow>,
    op: &'static str,
) -> Result<Vec<ThreadNode>, StoreError> {
    let mut level = fetch_leaf_level(pool, &rows, op).await?;
    Ok(rows.into_iter().map(|r| r.into_node(&mut level)).collect())
}

/// Look up a user's internal id by external identity, locking the row.
async fn lock_author(
    tx: &mut sqlx::PgConnection,
    identity: &str,
    op: &'static str,
) -> Result<Uuid, StoreError> {
    let author: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM users WHERE external_id = $1 FOR UPDATE")
            .bind(identity)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| store_error(OpKind::Write, op, e))?;

    author.ok_or_else(|| {
        tracing::warn!(author = identity, "Author has no profile");
        StoreError::Write(format!("author '{identity}' has no profile"))
    })
}

#[async_trait]
impl ThreadStore for PgThreadStore {
    async fn create_thread(&self, new: &NewThread) -> Result<Thread, StoreError> {
        bounded(self.op_timeout, OpKind::Write, "create thread", async {
            let pool = self.connector.connect().await?;
            let wrap = |e: sqlx::Error| store_error(OpKind::Write, "create thread", e);

            let mut tx = pool.begin().await.map_err(wrap)?;

            let author_id = lock_author(&mut tx, &new.author, "create thread").await?;

            // Unknown communities are not an error: the thread is created without one
            let community_id: Option<Uuid> = match &new.community {
                Some(external_id) => {
                    let found: Option<Uuid> = sqlx::query_scalar(
                        "SELECT id FROM communities WHERE external_id = $1 FOR UPDATE",
                    )
                    .bind(external_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(wrap)?;
                    if found.is_none() {
                        tracing::debug!(community = %external_id, "Community not found, posting without it");
                    }
                    found
                }
                None => None,
            };

            let row: ThreadRow = sqlx::query_as(
                r#"
                INSERT INTO threads (text, author_id, community_id)
                VALUES ($1, $2, $3)
                RETURNING id, text, parent_id, community_id, children, created_at
                "#,
            )
            .bind(new.text.as_str())
            .bind(author_id)
            .bind(community_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(wrap)?;

            sqlx::query("UPDATE users SET threads = array_append(threads, $1) WHERE id = $2")
                .bind(row.id)
                .bind(author_id)
                .execute(&mut *tx)
                .await
                .map_err(wrap)?;

            if let Some(community_id) = community_id {
                sqlx::query(
                    "UPDATE communities SET threads = array_append(threads, $1) WHERE id = $2",
                )
                .bind(row.id)
                .bind(community_id)
                .execute(&mut *tx)
                .await
                .map_err(wrap)?;
            }

            tx.commit().await.map_err(wrap)?;
            Ok(row.with_author(&new.author))
        })
        .await
    }

    async fn fetch_feed(&self, page: Pagination) -> Result<Paginated<ThreadNode>, StoreError> {
        bounded(self.op_timeout, OpKind::Read, "fetch feed", async {
            let pool = self.connector.connect().await?;
            let wrap = |e: sqlx::Error| store_error(OpKind::Read, "fetch feed", e);

            let rows = sqlx::query(&format!(
                r#"
                SELECT * FROM (
                    {NODE_SELECT}
                    WHERE t.parent_id IS NULL
                ) AS feed
                CROSS JOIN (SELECT COUNT(*) AS total FROM threads WHERE parent_id IS NULL) AS counted
                ORDER BY feed.created_at DESC, feed.id DESC
                LIMIT $1 OFFSET $2
                "#
            ))
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(pool)
            .await
            .map_err(wrap)?;

            let total = match rows.first() {
                Some(r) => r.try_get::<i64, _>("total").map_err(wrap)?,
                None => sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM threads WHERE parent_id IS NULL")
                    .fetch_one(pool)
                    .await
                    .map_err(wrap)?,
            };

            let roots = rows
                .iter()
                .map(NodeRow::from_row)
                .collect::<Result<Vec<_>, _>>()
                .map_err(wrap)?;

            let items = with_replies(pool, roots, "fetch feed").await?;
            Ok(Paginated::new(items, total, page))
        })
        .await
    }

    async fn fetch_thread(&self, id: Uuid) -> Result<Option<ThreadNode>, StoreError> {
        bounded(self.op_timeout, OpKind::Read, "fetch thread", async {
            let pool = self.connector.connect().await?;

            let Some(root) = fetch_nodes(pool, &[id], "fetch thread").await?.pop() else {
                return Ok(None);
            };

            // Two levels below the root, joined bottom-up
            let replies = fetch_nodes(pool, &root.children, "fetch thread").await?;
            let mut grandchildren = fetch_leaf_level(pool, &replies, "fetch thread").await?;
            let mut level: HashMap<Uuid, ThreadNode> = replies
                .into_iter()
                .map(|r| (r.id, r.into_node(&mut grandchildren)))
                .collect();

            Ok(Some(root.into_node(&mut level)))
        })
        .await
    }

    async fn add_reply(&self, reply: &NewReply) -> Result<Thread, StoreError> {
        bounded(self.op_timeout, OpKind::Write, "add reply", async {
            let pool = self.connector.connect().await?;
            let wrap = |e: sqlx::Error| store_error(OpKind::Write, "add reply", e);

            let mut tx = pool.begin().await.map_err(wrap)?;

            // Lock the parent so concurrent replies append in commit order
            let parent: Option<Uuid> =
                sqlx::query_scalar("SELECT id FROM threads WHERE id = $1 FOR UPDATE")
                    .bind(reply.parent_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(wrap)?;

            if parent.is_none() {
                // Dropping the transaction rolls it back; nothing was written
                return Err(StoreError::not_found("thread", reply.parent_id));
            }

            let author_id = lock_author(&mut tx, &reply.author, "add reply").await?;

            let row: ThreadRow = sqlx::query_as(
                r#"
                INSERT INTO threads (text, author_id, parent_id)
                VALUES ($1, $2, $3)
                RETURNING id, text, parent_id, community_id, children, created_at
                "#,
            )
            .bind(reply.text.as_str())
            .bind(author_id)
            .bind(reply.parent_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(wrap)?;

            sqlx::query("UPDATE threads SET children = array_append(children, $1) WHERE id = $2")
                .bind(row.id)
                .bind(reply.parent_id)
                .execute(&mut *tx)
                .await
                .map_err(wrap)?;

            tx.commit().await.map_err(wrap)?;
            Ok(row.with_author(&reply.author))
        })
        .await
    }

    async fn fetch_user_posts(&self, identity: &str) -> Result<Option<UserPosts>, StoreError> {
        bounded(self.op_timeout, OpKind::Read, "fetch user posts", async {
            let pool = self.connector.connect().await?;

            let Some(user) = sqlx::query(
                "SELECT external_id, name, username, image, threads FROM users WHERE external_id = $1",
            )
            .bind(identity)
            .fetch_optional(pool)
            .await
            .map_err(|e| store_error(OpKind::Read, "fetch user posts", e))?
            else {
                return Ok(None);
            };

            let column = |e| store_error(OpKind::Read, "fetch user posts", e);
            let author = Author {
                id: user.try_get("external_id").map_err(column)?,
                name: user.try_get("name").map_err(column)?,
                username: user.try_get("username").map_err(column)?,
                image: user.try_get("image").map_err(column)?,
            };
            let thread_ids: Vec<Uuid> = user.try_get("threads").map_err(column)?;

            let mut by_id: HashMap<Uuid, NodeRow> = fetch_nodes(pool, &thread_ids, "fetch user posts")
                .await?
                .into_iter()
                .map(|r| (r.id, r))
                .collect();
            let ordered = thread_ids.iter().filter_map(|id| by_id.remove(id)).collect();

            let threads = with_replies(pool, ordered, "fetch user posts").await?;
            Ok(Some(UserPosts { author, threads }))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::db::repos::PgUserStore;
    use crate::models::ProfileUpdate;
    use crate::store::UserStore;

    async fn stores() -> (PgUserStore, PgThreadStore) {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let config = StoreConfig::with_url(url);
        let connector = Arc::new(Connector::new(&config));
        crate::db::migrations::run(connector.connect().await.expect("connect failed"))
            .await
            .expect("migrations failed");
        (
            PgUserStore::new(Arc::clone(&connector), config.op_timeout),
            PgThreadStore::new(connector, config.op_timeout),
        )
    }

    async fn user(users: &PgUserStore) -> String {
        let identity = format!("user_{}", Uuid::new_v4().simple());
        let update =
            ProfileUpdate::new(&identity, "tester", "Test User", "", "https://img.test/a.png")
                .unwrap();
        users.upsert_profile(&update).await.expect("upsert failed");
        identity
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn reply_is_linked_both_ways() {
        let (users, threads) = stores().await;
        let author = user(&users).await;

        let root = threads
            .create_thread(&NewThread::new("root post", &author, None).unwrap())
            .await
            .unwrap();
        let reply = threads
            .add_reply(&NewReply::new(root.id, "a reply", &author).unwrap())
            .await
            .unwrap();
        assert_eq!(reply.parent_id, Some(root.id));

        let tree = threads.fetch_thread(root.id).await.unwrap().unwrap();
        assert_eq!(tree.replies.len(), 1);
        assert_eq!(tree.replies[0].text, "a reply");
        assert_eq!(tree.replies[0].author.id, author);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn reply_to_missing_parent_writes_nothing() {
        let (users, threads) = stores().await;
        let author = user(&users).await;
        let missing = Uuid::new_v4();

        let err = threads
            .add_reply(&NewReply::new(missing, "orphan", &author).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { resource: "thread", .. }));

        let posts = threads.fetch_user_posts(&author).await.unwrap().unwrap();
        assert!(posts.threads.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn feed_never_contains_replies() {
        let (users, threads) = stores().await;
        let author = user(&users).await;

        let root = threads
            .create_thread(&NewThread::new("feed root", &author, None).unwrap())
            .await
            .unwrap();
        threads
            .add_reply(&NewReply::new(root.id, "feed reply", &author).unwrap())
            .await
            .unwrap();

        let feed = threads.fetch_feed(Pagination::new(1, 100)).await.unwrap();
        assert!(feed.items.iter().all(|n| n.parent_id.is_none()));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn user_posts_keep_text_verbatim() {
        let (users, threads) = stores().await;
        let author = user(&users).await;
        let text = "  indented code\n";

        threads
            .create_thread(&NewThread::new(text, &author, None).unwrap())
            .await
            .unwrap();

        let posts = threads.fetch_user_posts(&author).await.unwrap().unwrap();
        assert_eq!(posts.author.id, author);
        assert_eq!(posts.author.username, "tester");
        assert_eq!(posts.threads.len(), 1);
        assert_eq!(posts.threads[0].text, text);
    }
}
