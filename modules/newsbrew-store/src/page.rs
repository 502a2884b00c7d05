// Pagination math. Page sizes are fixed per endpoint, never
// user-controlled.

use serde::Serialize;

/// Page size for the interactive search endpoint.
pub const SEARCH_PAGE_SIZE: i64 = 6;
/// Page size for bulk historical export.
pub const HISTORICAL_PAGE_SIZE: i64 = 200;

/// A requested page, clamped to a minimum of 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub size: i64,
}

impl Page {
    /// Missing or non-positive page numbers become page 1.
    pub fn new(requested: Option<i64>, size: i64) -> Self {
        Page {
            number: requested.unwrap_or(1).max(1),
            size,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.size
    }
}

/// ceil(total / page_size), with 0 pages for an empty result set.
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if total <= 0 {
        0
    } else {
        (total + page_size - 1) / page_size
    }
}

/// Pagination block returned by the interactive search endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_articles: i64,
    pub articles_per_page: i64,
}
