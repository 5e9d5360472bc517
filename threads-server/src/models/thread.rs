//! Thread records and reply trees

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profile::identity_of;
use super::user::{Author, CommunitySummary};
use super::ValidationError;

/// Validated thread body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadText(String);

impl ThreadText {
    /// Create a thread body.
    ///
    /// # Rules
    /// - Not blank; surrounding whitespace is kept as written
    ///
    /// # Example
    /// ```
    /// use threads_server::models::ThreadText;
    ///
    /// assert!(ThreadText::new("hello").is_ok());
    /// assert!(ThreadText::new("   ").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.trim().is_empty() {
            return Err(ValidationError::Empty { field: "text" });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Stored thread (post or reply)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: Uuid,
    pub text: String,
    /// Author's external identity
    pub author: String,
    /// Absent for top-level posts
    pub parent_id: Option<Uuid>,
    pub community_id: Option<Uuid>,
    /// Reply ids, in insertion order
    pub children: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Thread {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A thread joined with its author and, down to a fixed depth, its replies.
///
/// `replies` is only populated as deep as the fetch asked for;
/// `reply_count` always reflects the stored child list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadNode {
    pub id: Uuid,
    pub text: String,
    pub author: Author,
    pub parent_id: Option<Uuid>,
    pub community: Option<CommunitySummary>,
    pub created_at: DateTime<Utc>,
    pub reply_count: usize,
    pub replies: Vec<ThreadNode>,
}

/// A user's authored threads, each with replies joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPosts {
    pub author: Author,
    pub threads: Vec<ThreadNode>,
}

/// Input for a new top-level thread
#[derive(Debug, Clone)]
pub struct NewThread {
    pub text: ThreadText,
    pub author: String,
    /// External id of the community, resolved at creation time
    pub community: Option<String>,
}

impl NewThread {
    pub fn new(text: &str, author: &str, community: Option<&str>) -> Result<Self, ValidationError> {
        Ok(Self {
            text: ThreadText::new(text)?,
            author: identity_of(author)?,
            community: community
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_owned),
        })
    }
}

/// Input for a reply to an existing thread
#[derive(Debug, Clone)]
pub struct NewReply {
    pub parent_id: Uuid,
    pub text: ThreadText,
    pub author: String,
}

impl NewReply {
    pub fn new(parent_id: Uuid, text: &str, author: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            parent_id,
            text: ThreadText::new(text)?,
            author: identity_of(author)?,
        })
    }
}
