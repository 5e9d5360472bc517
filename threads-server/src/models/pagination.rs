//! Page windows over the feed and user search
//!
//! Pages are 1-based. The window for page `n` starts at `(n - 1) * per_page`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::ValidationError;

/// Upper bound on `per_page`
const PER_PAGE_CAP: u32 = 100;

pub const DEFAULT_PER_PAGE: u32 = 20;

/// A requested page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    /// Page numbers below 1 become 1; `per_page` is kept within `1..=100`.
    pub fn new(page: u32, per_page: u32) -> Self {
        Pagination {
            page: page.max(1),
            per_page: per_page.clamp(1, PER_PAGE_CAP),
        }
    }

    /// Records skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> u32 {
        self.per_page
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::new(1, DEFAULT_PER_PAGE)
    }
}

/// One page of results plus the total number of matching records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// Matches across all pages
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, window: Pagination) -> Self {
        Paginated {
            items,
            total,
            page: window.page,
            per_page: window.per_page,
        }
    }

    /// Nothing matched.
    pub fn empty(window: Pagination) -> Self {
        Paginated::new(Vec::new(), 0, window)
    }

    /// Whether more records remain after this page.
    ///
    /// `total > offset + items.len()`, evaluated exactly.
    pub fn is_next(&self) -> bool {
        let seen = Pagination::new(self.page, self.per_page).offset() + self.items.len() as u64;
        u64::try_from(self.total).is_ok_and(|total| total > seen)
    }
}

/// Creation-time ordering for user search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// SQL keyword for ORDER BY. Never user input.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(ValidationError::InvalidVariant {
                field: "sort",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

/// `?page=&per_page=` as received over HTTP; missing values take defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<PaginationParams> for Pagination {
    fn from(q: PaginationParams) -> Self {
        Pagination::new(q.page.unwrap_or(1), q.per_page.unwrap_or(DEFAULT_PER_PAGE))
    }
}
