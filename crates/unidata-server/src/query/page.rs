//! Pagination request and response metadata

use serde::{Deserialize, Serialize};

use super::QueryError;

/// Default page number (1-indexed).
pub const DEFAULT_PAGE: i64 = 1;

/// Default number of records per page.
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest page size a caller may request.
pub const MAX_LIMIT: i64 = 100;

/// A validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    limit: i64,
}

impl PageRequest {
    /// Validate a page window; `page` is 1-based and `limit` must be within `1..=MAX_LIMIT`.
    ///
    /// A page whose offset does not fit in an `i64` is rejected.
    pub fn new(page: i64, limit: i64) -> Result<Self, QueryError> {
        if page < 1 {
            return Err(QueryError::InvalidPage(page));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(QueryError::InvalidLimit(limit));
        }
        if (page - 1).checked_mul(limit).is_none() {
            return Err(QueryError::InvalidPage(page));
        }
        Ok(Self { page, limit })
    }

    /// Apply the defaults to whichever of `page`/`limit` is missing
    pub fn from_parts(page: Option<i64>, limit: Option<i64>) -> Result<Self, QueryError> {
        Self::new(page.unwrap_or(DEFAULT_PAGE), limit.unwrap_or(DEFAULT_LIMIT))
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Number of records to skip
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Pagination metadata for list responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl PaginationMeta {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if total == 0 || limit <= 0 {
            0
        } else {
            (total + limit - 1) / limit
        };

        Self {
            total,
            page,
            limit,
            pages,
        }
    }

    pub fn for_request(request: &PageRequest, total: i64) -> Self {
        Self::new(request.page(), request.limit(), total)
    }
}
