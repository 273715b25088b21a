//! Pagination request/result shapes shared by store and service layers.

use serde::{Deserialize, Serialize};

/// Which slice of an ordered match set to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PageRequest {
    /// Zero-based `page` of `size` records.
    Paged { page: u32, size: u32 },
    /// Every matching record.
    Unpaged,
}

impl PageRequest {
    pub fn of(page: u32, size: u32) -> Self {
        Self::Paged { page, size }
    }

    pub fn unpaged() -> Self {
        Self::Unpaged
    }

    /// Returns `(limit, offset)` for paged requests, `None` when unpaged.
    pub fn limit_offset(&self) -> Option<(u64, u64)> {
        match *self {
            Self::Paged { page, size } => {
                let size = u64::from(size);
                Some((size, u64::from(page) * size))
            }
            Self::Unpaged => None,
        }
    }
}

/// One slice of a match set plus the total match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Count of all matching records, independent of the slice.
    pub total: u64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            request,
        }
    }

    /// Number of pages the match set spans; `1` for unpaged requests.
    pub fn total_pages(&self) -> u64 {
        match self.request {
            PageRequest::Paged { size, .. } if size > 0 => self.total.div_ceil(u64::from(size)),
            PageRequest::Paged { .. } => 0,
            PageRequest::Unpaged => 1,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            request: self.request,
        }
    }
}
