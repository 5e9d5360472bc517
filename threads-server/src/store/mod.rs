//! Store traits
//!
//! Operations are written against these traits; [`crate::db`] implements
//! them on Postgres and [`memory`] implements them in-process.
//!
//! "Not found" contract: point reads return `Ok(None)`. Only
//! [`ThreadStore::add_reply`] fails with [`StoreError::NotFound`], for a
//! missing parent.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    Community, CommunityUpdate, NewReply, NewThread, Paginated, Pagination, ProfileUpdate, Thread,
    ThreadNode, User, UserPosts, UserQuery,
};

pub use memory::MemoryStore;

/// User Directory
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Create the profile if absent, otherwise update it. Always marks the
    /// user onboarded.
    async fn upsert_profile(&self, update: &ProfileUpdate) -> Result<User, StoreError>;

    async fn get_by_identity(&self, identity: &str) -> Result<Option<User>, StoreError>;

    /// Users matching `query.text`, excluding `query.exclude`, ordered by
    /// creation time.
    async fn search(&self, query: &UserQuery) -> Result<Paginated<User>, StoreError>;
}

/// Community Directory
#[async_trait]
pub trait CommunityStore: Send + Sync + 'static {
    async fn upsert(&self, update: &CommunityUpdate) -> Result<Community, StoreError>;

    async fn get_by_external_id(&self, external_id: &str) -> Result<Option<Community>, StoreError>;
}

/// Thread Store
#[async_trait]
pub trait ThreadStore: Send + Sync + 'static {
    /// Create a top-level thread and link it to its author and, if the
    /// community resolves, to that community. All or nothing.
    async fn create_thread(&self, new: &NewThread) -> Result<Thread, StoreError>;

    /// Top-level threads, newest first, with one level of replies joined.
    async fn fetch_feed(&self, page: Pagination) -> Result<Paginated<ThreadNode>, StoreError>;

    /// A thread with two levels of replies joined.
    async fn fetch_thread(&self, id: Uuid) -> Result<Option<ThreadNode>, StoreError>;

    /// Create a reply and append it to the parent's children, atomically.
    async fn add_reply(&self, reply: &NewReply) -> Result<Thread, StoreError>;

    /// Threads authored by a user, in the order they were created, with
    /// one level of replies joined. `None` when the user has no record.
    async fn fetch_user_posts(&self, identity: &str) -> Result<Option<UserPosts>, StoreError>;
}
