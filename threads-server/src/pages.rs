//! Page-shaped reads for the presentation layer
//!
//! Search and profile pages are gated on a signed-in, onboarded viewer.
//! The home page is open to everyone and never fails: read errors become a
//! notice on the page.

use serde::Serialize;

use crate::actions::Actions;
use crate::error::Result;
use crate::models::{Paginated, Pagination, SortDirection, ThreadNode, User};

pub const NO_THREADS_NOTICE: &str = "No Thread Found";
pub const FEED_ERROR_NOTICE: &str = "Error fetching threads. Please try again later.";
pub const NO_USERS_NOTICE: &str = "No users found";

/// Outcome of a gated page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "page", rename_all = "snake_case")]
pub enum Gate<T> {
    /// No viewer identity
    SignedOut,
    /// Viewer has no profile yet, or has not finished onboarding
    NeedsOnboarding,
    Ready(T),
}

impl<T> Gate<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(page) => Some(page),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HomePage {
    /// Identity of the signed-in viewer, if any
    pub viewer: Option<String>,
    pub feed: Paginated<ThreadNode>,
    pub is_next: bool,
    pub notice: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub users: Paginated<User>,
    pub is_next: bool,
    pub notice: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfilePage {
    pub user: User,
    pub threads: Vec<ThreadNode>,
}

/// Resolve the viewer, returning the gate outcome when they may not proceed.
async fn onboarded_viewer(actions: &Actions, viewer: Option<&str>) -> Result<Gate<User>> {
    let Some(identity) = viewer else {
        return Ok(Gate::SignedOut);
    };
    match actions.get_user_by_identity(identity).await? {
        Some(user) if user.onboarded => Ok(Gate::Ready(user)),
        _ => Ok(Gate::NeedsOnboarding),
    }
}

/// The feed, newest first.
pub async fn home_page(actions: &Actions, viewer: Option<&str>, page: Pagination) -> HomePage {
    let viewer = viewer.map(str::to_owned);
    match actions.fetch_feed(page).await {
        Ok(feed) => HomePage {
            viewer,
            is_next: feed.is_next(),
            notice: feed.items.is_empty().then_some(NO_THREADS_NOTICE),
            feed,
        },
        Err(e) => {
            tracing::error!(error = %e, "Error fetching feed");
            HomePage {
                viewer,
                feed: Paginated::empty(page),
                is_next: false,
                notice: Some(FEED_ERROR_NOTICE),
            }
        }
    }
}

/// Other users matching `text`, for an onboarded viewer.
pub async fn search_page(
    actions: &Actions,
    viewer: Option<&str>,
    text: &str,
    page: Pagination,
    sort: SortDirection,
) -> Result<Gate<SearchPage>> {
    let me = match onboarded_viewer(actions, viewer).await? {
        Gate::Ready(user) => user,
        Gate::SignedOut => return Ok(Gate::SignedOut),
        Gate::NeedsOnboarding => return Ok(Gate::NeedsOnboarding),
    };

    let users = actions
        .search_users(&me.external_id, text, page, sort)
        .await?;
    Ok(Gate::Ready(SearchPage {
        is_next: users.is_next(),
        notice: users.items.is_empty().then_some(NO_USERS_NOTICE),
        users,
    }))
}

/// A profile with its authored threads. `Ready(None)` when `identity`
/// has no profile.
pub async fn profile_page(
    actions: &Actions,
    viewer: Option<&str>,
    identity: &str,
) -> Result<Gate<Option<ProfilePage>>> {
    match onboarded_viewer(actions, viewer).await? {
        Gate::Ready(_) => {}
        Gate::SignedOut => return Ok(Gate::SignedOut),
        Gate::NeedsOnboarding => return Ok(Gate::NeedsOnboarding),
    }

    let Some(user) = actions.get_user_by_identity(identity).await? else {
        return Ok(Gate::Ready(None));
    };
    let threads = actions
        .fetch_user_posts(identity)
        .await?
        .map(|posts| posts.threads)
        .unwrap_or_default();

    Ok(Gate::Ready(Some(ProfilePage { user, threads })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::{NewReply, NewThread, Thread, UserPosts};
    use crate::revalidate::NoopRevalidator;
    use crate::store::{MemoryStore, ThreadStore};
    use async_trait::async_trait;
    use std::sync::Arc;
    use uuid::Uuid;

    /// Thread store whose reads always fail
    struct BrokenThreads;

    #[async_trait]
    impl ThreadStore for BrokenThreads {
        async fn create_thread(&self, _: &NewThread) -> std::result::Result<Thread, StoreError> {
            Err(StoreError::Write("down".into()))
        }
        async fn fetch_feed(
            &self,
            _: Pagination,
        ) -> std::result::Result<Paginated<ThreadNode>, StoreError> {
            Err(StoreError::Read("down".into()))
        }
        async fn fetch_thread(&self, _: Uuid) -> std::result::Result<Option<ThreadNode>, StoreError> {
            Err(StoreError::Read("down".into()))
        }
        async fn add_reply(&self, _: &NewReply) -> std::result::Result<Thread, StoreError> {
            Err(StoreError::Write("down".into()))
        }
        async fn fetch_user_posts(
            &self,
            _: &str,
        ) -> std::result::Result<Option<UserPosts>, StoreError> {
            Err(StoreError::Read("down".into()))
        }
    }

    const IMG: &str = "https://img.test/a.png";

    fn actions() -> Actions {
        Actions::in_memory(MemoryStore::new(), Arc::new(NoopRevalidator))
    }

    async fn onboard(actions: &Actions, identity: &str, username: &str) {
        actions
            .upsert_user_profile(identity, username, "Some Name", "", IMG, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_feed_carries_notice() {
        let page = home_page(&actions(), None, Pagination::new(1, 30)).await;
        assert_eq!(page.notice, Some(NO_THREADS_NOTICE));
        assert!(!page.is_next);
    }

    #[tokio::test]
    async fn feed_read_error_becomes_notice() {
        let store = Arc::new(MemoryStore::new());
        let actions = Actions::new(
            store.clone(),
            store,
            Arc::new(BrokenThreads),
            Arc::new(NoopRevalidator),
        );

        let page = home_page(&actions, None, Pagination::new(1, 30)).await;
        assert_eq!(page.notice, Some(FEED_ERROR_NOTICE));
        assert!(page.feed.items.is_empty());
    }

    #[tokio::test]
    async fn feed_without_notice_once_posted() {
        let actions = actions();
        onboard(&actions, "u1", "alice").await;
        actions.create_thread("hello", "u1", None, "/").await.unwrap();

        let page = home_page(&actions, Some("u1"), Pagination::new(1, 30)).await;
        assert!(page.notice.is_none());
        assert_eq!(page.viewer.as_deref(), Some("u1"));
        assert_eq!(page.feed.items.len(), 1);
    }

    #[tokio::test]
    async fn search_is_gated() {
        let actions = actions();
        let page = Pagination::new(1, 25);

        let gate = search_page(&actions, None, "", page, SortDirection::Desc)
            .await
            .unwrap();
        assert!(matches!(gate, Gate::SignedOut));

        let gate = search_page(&actions, Some("u1"), "", page, SortDirection::Desc)
            .await
            .unwrap();
        assert!(matches!(gate, Gate::NeedsOnboarding));
    }

    #[tokio::test]
    async fn lone_user_sees_no_users_notice() {
        let actions = actions();
        onboard(&actions, "u1", "alice").await;

        let page = search_page(
            &actions,
            Some("u1"),
            "",
            Pagination::new(1, 25),
            SortDirection::Desc,
        )
        .await
        .unwrap()
        .ready()
        .unwrap();
        assert_eq!(page.notice, Some(NO_USERS_NOTICE));
        assert!(page.users.items.is_empty());
    }

    #[tokio::test]
    async fn profile_page_lists_threads() {
        let actions = actions();
        onboard(&actions, "u1", "alice").await;
        onboard(&actions, "u2", "bob").await;
        actions.create_thread("bob's post", "u2", None, "/").await.unwrap();

        let page = profile_page(&actions, Some("u1"), "u2")
            .await
            .unwrap()
            .ready()
            .flatten()
            .unwrap();
        assert_eq!(page.user.username, "bob");
        assert_eq!(page.threads.len(), 1);

        let missing = profile_page(&actions, Some("u1"), "nobody").await.unwrap();
        assert_eq!(missing, Gate::Ready(None));
    }
}
