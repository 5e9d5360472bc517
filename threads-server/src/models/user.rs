//! User and community records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Identity issued by the auth provider
    pub external_id: String,
    pub username: String,
    pub name: String,
    pub bio: String,
    pub image: String,
    pub onboarded: bool,
    /// Authored thread ids, in insertion order
    pub threads: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn author(&self) -> Author {
        Author {
            id: self.external_id.clone(),
            name: self.name.clone(),
            username: self.username.clone(),
            image: self.image.clone(),
        }
    }
}

/// Public profile fields joined onto threads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// External identity
    pub id: String,
    pub name: String,
    pub username: String,
    pub image: String,
}

/// Stored community
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub id: Uuid,
    pub external_id: String,
    pub username: String,
    pub name: String,
    pub bio: String,
    pub image: String,
    /// Threads posted into the community, in insertion order
    pub threads: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Community {
    pub fn summary(&self) -> CommunitySummary {
        CommunitySummary {
            id: self.external_id.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
        }
    }
}

/// Community fields joined onto threads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunitySummary {
    /// External id
    pub id: String,
    pub name: String,
    pub image: String,
}
