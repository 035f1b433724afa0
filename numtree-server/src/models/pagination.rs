//! Limit/offset pagination

use serde::{Deserialize, Serialize};

/// Maximum items per request
const MAX_LIMIT: u32 = 100;

/// Default items per request
const DEFAULT_LIMIT: u32 = 10;

/// Pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Items to return (1..=100)
    pub limit: u32,
    /// Items to skip
    pub offset: u32,
}

impl Pagination {
    /// Create pagination with validation.
    ///
    /// - A limit of 0 means the default (10)
    /// - Limit is clamped to 1..=100
    pub fn new(limit: u32, offset: u32) -> Self {
        let limit = if limit == 0 { DEFAULT_LIMIT } else { limit };
        Self {
            limit: limit.min(MAX_LIMIT),
            offset,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Paginated result wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items for current window
    pub items: Vec<T>,
    /// Total count across all windows
    pub total: i64,
    pub limit: u32,
    pub offset: u32,
}

impl<T> Paginated<T> {
    /// Check if more items follow this window.
    pub fn has_more(&self) -> bool {
        (self.offset as i64 + self.items.len() as i64) < self.total
    }

    /// Convert the items, keeping the window metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// Query parameters for pagination
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl From<PaginationParams> for Pagination {
    fn from(params: PaginationParams) -> Self {
        Self::new(
            params.limit.unwrap_or(DEFAULT_LIMIT),
            params.offset.unwrap_or(0),
        )
    }
}
