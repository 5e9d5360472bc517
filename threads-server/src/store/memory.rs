//! In-process store
//!
//! Used when no `DATABASE_URL` is configured, and in tests. Each mutation
//! holds the write lock for its whole duration, so readers never observe
//! half of a multi-record write.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CommunityStore, ThreadStore, UserStore};
use crate::error::StoreError;
use crate::models::{
    Community, CommunityUpdate, NewReply, NewThread, Paginated, Pagination, ProfileUpdate,
    SortDirection, Thread, ThreadNode, User, UserPosts, UserQuery,
};

/// Record plus its insertion sequence, which breaks creation-time ties.
#[derive(Debug, Clone)]
struct Entry<T> {
    seq: u64,
    value: T,
}

#[derive(Debug, Default)]
struct State {
    seq: u64,
    /// Keyed by external identity
    users: HashMap<String, Entry<User>>,
    /// Keyed by external id
    communities: HashMap<String, Entry<Community>>,
    threads: HashMap<Uuid, Entry<Thread>>,
}

impl State {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Join a thread with its author and community, and replies down to
    /// `depth` levels.
    fn node(&self, id: &Uuid, depth: usize) -> Option<ThreadNode> {
        let thread = &self.threads.get(id)?.value;
        let author = self.users.get(&thread.author)?.value.author();
        let community = thread.community_id.and_then(|cid| {
            self.communities
                .values()
                .find(|c| c.value.id == cid)
                .map(|c| c.value.summary())
        });

        let replies = if depth == 0 {
            Vec::new()
        } else {
            thread
                .children
                .iter()
                .filter_map(|child| self.node(child, depth - 1))
                .collect()
        };

        Some(ThreadNode {
            id: thread.id,
            text: thread.text.clone(),
            author,
            parent_id: thread.parent_id,
            community,
            created_at: thread.created_at,
            reply_count: thread.children.len(),
            replies,
        })
    }

    fn insert_thread(
        &mut self,
        text: &str,
        author: &str,
        parent_id: Option<Uuid>,
        community_id: Option<Uuid>,
    ) -> Thread {
        let thread = Thread {
            id: Uuid::new_v4(),
            text: text.to_owned(),
            author: author.to_owned(),
            parent_id,
            community_id,
            children: Vec::new(),
            created_at: Utc::now(),
        };
        let seq = self.next_seq();
        self.threads.insert(
            thread.id,
            Entry {
                seq,
                value: thread.clone(),
            },
        );
        thread
    }
}

/// In-memory implementation of every store trait
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored threads, replies included.
    pub async fn thread_count(&self) -> usize {
        self.state.read().await.threads.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn upsert_profile(&self, update: &ProfileUpdate) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        let seq = state.next_seq();

        let entry = state
            .users
            .entry(update.identity.clone())
            .or_insert_with(|| Entry {
                seq,
                value: User {
                    id: Uuid::new_v4(),
                    external_id: update.identity.clone(),
                    username: String::new(),
                    name: String::new(),
                    bio: String::new(),
                    image: String::new(),
                    onboarded: false,
                    threads: Vec::new(),
                    created_at: Utc::now(),
                },
            });

        let user = &mut entry.value;
        user.username = update.username.as_str().to_owned();
        user.name = update.name.as_str().to_owned();
        user.bio = update.bio.as_str().to_owned();
        user.image = update.image.as_str().to_owned();
        user.onboarded = true;

        Ok(user.clone())
    }

    async fn get_by_identity(&self, identity: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.get(identity).map(|e| e.value.clone()))
    }

    async fn search(&self, query: &UserQuery) -> Result<Paginated<User>, StoreError> {
        let state = self.state.read().await;

        let mut matching: Vec<&Entry<User>> = state
            .users
            .values()
            .filter(|e| e.value.external_id != query.exclude)
            .filter(|e| query.matches(&e.value.username, &e.value.name))
            .collect();

        matching.sort_by_key(|e| (e.value.created_at, e.seq));
        if query.sort == SortDirection::Desc {
            matching.reverse();
        }

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(query.page.offset() as usize)
            .take(query.page.limit() as usize)
            .map(|e| e.value.clone())
            .collect();

        Ok(Paginated::new(items, total, query.page))
    }
}

#[async_trait]
impl CommunityStore for MemoryStore {
    async fn upsert(&self, update: &CommunityUpdate) -> Result<Community, StoreError> {
        let mut state = self.state.write().await;
        let seq = state.next_seq();

        let entry = state
            .communities
            .entry(update.external_id.clone())
            .or_insert_with(|| Entry {
                seq,
                value: Community {
                    id: Uuid::new_v4(),
                    external_id: update.external_id.clone(),
                    username: String::new(),
                    name: String::new(),
                    bio: String::new(),
                    image: String::new(),
                    threads: Vec::new(),
                    created_at: Utc::now(),
                },
            });

        let community = &mut entry.value;
        community.username = update.username.as_str().to_owned();
        community.name = update.name.as_str().to_owned();
        community.bio = update.bio.as_str().to_owned();
        community.image = update.image.as_str().to_owned();

        Ok(community.clone())
    }

    async fn get_by_external_id(&self, external_id: &str) -> Result<Option<Community>, StoreError> {
        let state = self.state.read().await;
        Ok(state.communities.get(external_id).map(|e| e.value.clone()))
    }
}

#[async_trait]
impl ThreadStore for MemoryStore {
    async fn create_thread(&self, new: &NewThread) -> Result<Thread, StoreError> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(&new.author) {
            tracing::warn!(author = %new.author, "Author has no profile");
            return Err(StoreError::Write(format!(
                "author '{}' has no profile",
                new.author
            )));
        }

        let community_id = new
            .community
            .as_ref()
            .and_then(|ext| state.communities.get(ext))
            .map(|e| e.value.id);

        let thread = state.insert_thread(new.text.as_str(), &new.author, None, community_id);

        if let Some(user) = state.users.get_mut(&new.author) {
            user.value.threads.push(thread.id);
        }
        if let Some(ext) = new.community.as_ref().filter(|_| community_id.is_some()) {
            if let Some(community) = state.communities.get_mut(ext) {
                community.value.threads.push(thread.id);
            }
        }

        Ok(thread)
    }

    async fn fetch_feed(&self, page: Pagination) -> Result<Paginated<ThreadNode>, StoreError> {
        let state = self.state.read().await;

        let mut roots: Vec<&Entry<Thread>> = state
            .threads
            .values()
            .filter(|e| e.value.is_top_level())
            .collect();
        roots.sort_by_key(|e| std::cmp::Reverse((e.value.created_at, e.seq)));

        let total = roots.len() as i64;
        let items = roots
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .filter_map(|e| state.node(&e.value.id, 1))
            .collect();

        Ok(Paginated::new(items, total, page))
    }

    async fn fetch_thread(&self, id: Uuid) -> Result<Option<ThreadNode>, StoreError> {
        let state = self.state.read().await;
        Ok(state.node(&id, 2))
    }

    async fn add_reply(&self, reply: &NewReply) -> Result<Thread, StoreError> {
        let mut state = self.state.write().await;

        if !state.threads.contains_key(&reply.parent_id) {
            return Err(StoreError::not_found("thread", reply.parent_id));
        }
        if !state.users.contains_key(&reply.author) {
            tracing::warn!(author = %reply.author, "Author has no profile");
            return Err(StoreError::Write(format!(
                "author '{}' has no profile",
                reply.author
            )));
        }

        let thread = state.insert_thread(
            reply.text.as_str(),
            &reply.author,
            Some(reply.parent_id),
            None,
        );

        if let Some(parent) = state.threads.get_mut(&reply.parent_id) {
            parent.value.children.push(thread.id);
        }

        Ok(thread)
    }

    async fn fetch_user_posts(&self, identity: &str) -> Result<Option<UserPosts>, StoreError> {
        let state = self.state.read().await;

        let Some(user) = state.users.get(identity) else {
            return Ok(None);
        };

        let threads = user
            .value
            .threads
            .iter()
            .filter_map(|id| state.node(id, 1))
            .collect();

        Ok(Some(UserPosts {
            author: user.value.author(),
            threads,
        }))
    }
}
