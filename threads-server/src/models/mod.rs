//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod profile;
pub mod user;
pub mod thread;
pub mod pagination;

pub use validation::ValidationError;
pub use profile::{Bio, CommunityUpdate, DisplayName, ImageUrl, ProfileUpdate, Username};
pub use user::{Author, Community, CommunitySummary, User};
pub use thread::{NewReply, NewThread, Thread, ThreadNode, ThreadText, UserPosts};
pub use pagination::{Paginated, Pagination, PaginationParams, SortDirection, DEFAULT_PER_PAGE};

/// User search request
#[derive(Debug, Clone)]
pub struct UserQuery {
    /// Identity to leave out of the results (the caller)
    pub exclude: String,
    /// Case-insensitive substring of username or name; blank matches all
    pub text: String,
    pub page: Pagination,
    pub sort: SortDirection,
}

impl UserQuery {
    pub fn new(exclude: &str, text: &str, page: Pagination, sort: SortDirection) -> Self {
        Self {
            exclude: exclude.to_owned(),
            text: text.to_owned(),
            page,
            sort,
        }
    }

    /// Whether a user's username or name matches the search text.
    pub fn matches(&self, username: &str, name: &str) -> bool {
        if self.text.trim().is_empty() {
            return true;
        }
        let needle = self.text.to_lowercase();
        username.to_lowercase().contains(&needle) || name.to_lowercase().contains(&needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_matches_everything() {
        let q = UserQuery::new("u1", "", Pagination::default(), SortDirection::Desc);
        assert!(q.matches("anyone", "Any One"));
    }

    #[test]
    fn query_is_case_insensitive_over_both_fields() {
        let q = UserQuery::new("u1", "DOE", Pagination::default(), SortDirection::Desc);
        assert!(q.matches("alice", "Alice Doe"));
        assert!(q.matches("johndoe", "John"));
        assert!(!q.matches("bob", "Bob Smith"));
    }

    #[test]
    fn query_whitespace_is_part_of_the_needle() {
        let q = UserQuery::new("u1", " doe", Pagination::default(), SortDirection::Desc);
        assert!(q.matches("alice", "Alice Doe"));
        assert!(!q.matches("johndoe", "John"));

        let blank = UserQuery::new("u1", "   ", Pagination::default(), SortDirection::Desc);
        assert!(blank.matches("johndoe", "John"));
    }
}
