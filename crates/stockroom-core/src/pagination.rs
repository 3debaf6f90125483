//! Offset/limit pagination.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

/// A normalised page request: `page ≥ 1`, `1 ≤ limit ≤ 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    limit: i64,
}

impl PageRequest {
    /// Builds a request from raw query values, applying defaults and clamps.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::PageRequest;
    ///
    /// let req = PageRequest::new(None, Some(500));
    /// assert_eq!((req.page(), req.limit()), (1, 100));
    /// assert_eq!(PageRequest::new(Some(3), Some(20)).offset(), 40);
    /// ```
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Rows to skip. Saturates for pages far past the end.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Page metadata for a result set of `total_data` rows.
    pub fn paginate(&self, total_data: i64) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
            total_data,
            total_pages: (total_data + self.limit - 1) / self.limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Page metadata returned next to list data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total_data: i64,
    pub total_pages: i64,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total_data: i64) -> Self {
        Self {
            data,
            pagination: request.paginate(total_data),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
