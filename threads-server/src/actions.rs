//! Operations exposed to the presentation layer
//!
//! Each operation validates its input, runs against the stores, and for
//! mutations signals page revalidation once the write has committed.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::{
    Community, CommunityUpdate, NewReply, NewThread, Paginated, Pagination, ProfileUpdate,
    SortDirection, Thread, ThreadNode, User, UserPosts, UserQuery,
};
use crate::revalidate::{Revalidator, PROFILE_EDIT_PATH};
use crate::store::{CommunityStore, MemoryStore, ThreadStore, UserStore};

/// Prefix a store error's message with the failed operation, logging it.
fn context(op: &'static str) -> impl FnOnce(StoreError) -> StoreError {
    move |e| {
        tracing::error!(op, error = %e, "Operation failed");
        match e {
            StoreError::Read(msg) => StoreError::Read(format!("{op}: {msg}")),
            StoreError::Write(msg) => StoreError::Write(format!("{op}: {msg}")),
            other => other,
        }
    }
}

/// Threads operations over a set of stores
#[derive(Clone)]
pub struct Actions {
    users: Arc<dyn UserStore>,
    communities: Arc<dyn CommunityStore>,
    threads: Arc<dyn ThreadStore>,
    revalidator: Arc<dyn Revalidator>,
}

impl Actions {
    pub fn new(
        users: Arc<dyn UserStore>,
        communities: Arc<dyn CommunityStore>,
        threads: Arc<dyn ThreadStore>,
        revalidator: Arc<dyn Revalidator>,
    ) -> Self {
        Self {
            users,
            communities,
            threads,
            revalidator,
        }
    }

    /// All three stores backed by one in-process store.
    pub fn in_memory(store: MemoryStore, revalidator: Arc<dyn Revalidator>) -> Self {
        let store = Arc::new(store);
        Self::new(store.clone(), store.clone(), store, revalidator)
    }

    /// Save a profile, creating it on first save. The saved user is
    /// onboarded and its username lowercase.
    ///
    /// Revalidates `path` only when it is the profile edit page.
    pub async fn upsert_user_profile(
        &self,
        identity: &str,
        username: &str,
        name: &str,
        bio: &str,
        image: &str,
        path: Option<&str>,
    ) -> Result<User> {
        let update = ProfileUpdate::new(identity, username, name, bio, image)?;

        let user = self
            .users
            .upsert_profile(&update)
            .await
            .map_err(context("Error updating user"))?;
        tracing::info!(identity = %user.external_id, username = %user.username, "Profile saved");

        if path == Some(PROFILE_EDIT_PATH) {
            self.revalidator.revalidate(PROFILE_EDIT_PATH).await;
        }
        Ok(user)
    }

    /// Look up a profile. `None` when the identity has no record.
    pub async fn get_user_by_identity(&self, identity: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .get_by_identity(identity)
            .await
            .map_err(context("Error fetching user"))?)
    }

    /// Users whose username or name contains `text`, excluding `exclude`.
    pub async fn search_users(
        &self,
        exclude: &str,
        text: &str,
        page: Pagination,
        sort: SortDirection,
    ) -> Result<Paginated<User>> {
        let query = UserQuery::new(exclude, text, page, sort);
        Ok(self
            .users
            .search(&query)
            .await
            .map_err(context("Error fetching users"))?)
    }

    /// Register or update a community.
    pub async fn upsert_community(
        &self,
        external_id: &str,
        username: &str,
        name: &str,
        bio: &str,
        image: &str,
    ) -> Result<Community> {
        let update = CommunityUpdate::new(external_id, username, name, bio, image)?;
        let community = self
            .communities
            .upsert(&update)
            .await
            .map_err(context("Error saving community"))?;
        tracing::info!(community = %community.external_id, "Community saved");
        Ok(community)
    }

    /// Look up a community. `None` when the external id has no record.
    pub async fn get_community(&self, external_id: &str) -> Result<Option<Community>> {
        Ok(self
            .communities
            .get_by_external_id(external_id)
            .await
            .map_err(context("Error fetching community"))?)
    }

    /// Post a top-level thread, then revalidate `path`.
    pub async fn create_thread(
        &self,
        text: &str,
        author: &str,
        community: Option<&str>,
        path: &str,
    ) -> Result<Thread> {
        let new = NewThread::new(text, author, community)?;

        let thread = self
            .threads
            .create_thread(&new)
            .await
            .map_err(context("Failed to create thread"))?;
        tracing::info!(thread = %thread.id, author = %thread.author, "Thread created");

        self.revalidator.revalidate(path).await;
        Ok(thread)
    }

    /// Top-level threads, newest first.
    pub async fn fetch_feed(&self, page: Pagination) -> Result<Paginated<ThreadNode>> {
        Ok(self
            .threads
            .fetch_feed(page)
            .await
            .map_err(context("Failed to fetch posts"))?)
    }

    /// A thread with two levels of replies. `None` when `id` does not resolve.
    pub async fn fetch_thread_by_id(&self, id: Uuid) -> Result<Option<ThreadNode>> {
        Ok(self
            .threads
            .fetch_thread(id)
            .await
            .map_err(context("Error fetching thread"))?)
    }

    /// Reply to a thread, then revalidate `path`.
    ///
    /// Fails with [`StoreError::NotFound`] when the parent does not exist.
    pub async fn add_reply(
        &self,
        parent_id: Uuid,
        text: &str,
        author: &str,
        path: &str,
    ) -> Result<Thread> {
        let reply = NewReply::new(parent_id, text, author)?;

        let thread = self
            .threads
            .add_reply(&reply)
            .await
            .map_err(context("Error adding comment"))?;
        tracing::info!(thread = %thread.id, parent = %parent_id, "Reply added");

        self.revalidator.revalidate(path).await;
        Ok(thread)
    }

    /// A user's threads. `None` when the user has no record.
    pub async fn fetch_user_posts(&self, identity: &str) -> Result<Option<UserPosts>> {
        Ok(self
            .threads
            .fetch_user_posts(identity)
            .await
            .map_err(context("Error fetching user posts"))?)
    }
}
