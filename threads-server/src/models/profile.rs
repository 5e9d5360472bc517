//! Profile field validation
//!
//! Usernames are normalized to lowercase at construction, so every
//! value that reaches a store is already in its persisted form.

use reqwest::Url;

use super::validation::char_len;
use super::ValidationError;

const MIN_USERNAME_LEN: usize = 3;
const MIN_NAME_LEN: usize = 3;
const MAX_NAME_LEN: usize = 30;
const MAX_BIO_LEN: usize = 100;

/// Lowercase username
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Create a username.
    ///
    /// # Rules
    /// - Trimmed, then lowercased
    /// - At least 3 characters
    ///
    /// # Example
    /// ```
    /// use threads_server::models::Username;
    ///
    /// assert_eq!(Username::new("Alice").unwrap().as_str(), "alice");
    /// assert!(Username::new("al").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "username" });
        }

        if char_len(trimmed) < MIN_USERNAME_LEN {
            return Err(ValidationError::TooShort {
                field: "username",
                min: MIN_USERNAME_LEN,
            });
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Display name, 3 to 30 characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "name" });
        }

        let len = char_len(trimmed);
        if len < MIN_NAME_LEN {
            return Err(ValidationError::TooShort {
                field: "name",
                min: MIN_NAME_LEN,
            });
        }
        if len > MAX_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "name",
                max: MAX_NAME_LEN,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Biography text, may be empty
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bio(String);

impl Bio {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if char_len(trimmed) > MAX_BIO_LEN {
            return Err(ValidationError::TooLong {
                field: "bio",
                max: MAX_BIO_LEN,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Absolute http(s) URL of an avatar image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrl(String);

impl ImageUrl {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "image" });
        }

        let url = Url::parse(trimmed).map_err(|_| ValidationError::InvalidFormat {
            field: "image",
            reason: "must be an absolute URL",
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidFormat {
                field: "image",
                reason: "must use http or https",
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A validated profile save, keyed by the external identity.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub identity: String,
    pub username: Username,
    pub name: DisplayName,
    pub bio: Bio,
    pub image: ImageUrl,
}

impl ProfileUpdate {
    pub fn new(
        identity: &str,
        username: &str,
        name: &str,
        bio: &str,
        image: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            identity: identity_of(identity)?,
            username: Username::new(username)?,
            name: DisplayName::new(name)?,
            bio: Bio::new(bio)?,
            image: ImageUrl::new(image)?,
        })
    }
}

/// A validated community registration.
#[derive(Debug, Clone)]
pub struct CommunityUpdate {
    pub external_id: String,
    pub username: Username,
    pub name: DisplayName,
    pub bio: Bio,
    pub image: ImageUrl,
}

impl CommunityUpdate {
    pub fn new(
        external_id: &str,
        username: &str,
        name: &str,
        bio: &str,
        image: &str,
    ) -> Result<Self, ValidationError> {
        let external_id = external_id.trim();
        if external_id.is_empty() {
            return Err(ValidationError::Empty {
                field: "community id",
            });
        }

        Ok(Self {
            external_id: external_id.to_owned(),
            username: Username::new(username)?,
            name: DisplayName::new(name)?,
            bio: Bio::new(bio)?,
            image: ImageUrl::new(image)?,
        })
    }
}

/// Identity strings are opaque but never blank.
pub(crate) fn identity_of(s: &str) -> Result<String, ValidationError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field: "identity" });
    }
    Ok(trimmed.to_owned())
}
