use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Page sizes a grid may use
pub const PAGE_SIZES: [usize; 3] = [10, 20, 50];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid page size {0} (expected one of 10, 20, 50)")]
pub struct PageSizeError(pub usize);

/// Rows per page, restricted to [`PAGE_SIZES`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct PageSize(usize);

impl PageSize {
    pub fn new(size: usize) -> Result<Self, PageSizeError> {
        if PAGE_SIZES.contains(&size) {
            Ok(PageSize(size))
        } else {
            Err(PageSizeError(size))
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize(PAGE_SIZES[0])
    }
}

impl TryFrom<usize> for PageSize {
    type Error = PageSizeError;

    fn try_from(size: usize) -> Result<Self, Self::Error> {
        PageSize::new(size)
    }
}

impl From<PageSize> for usize {
    fn from(size: PageSize) -> usize {
        size.0
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `max(1, ceil(rows / page_size))`. There is always at least one page, even
/// for an empty set. A zero page size is treated as one row per page.
pub fn total_pages(row_count: usize, page_size: usize) -> usize {
    row_count.div_ceil(page_size.max(1)).max(1)
}

/// Clamp a 1-based page number into `[1, total]`
pub fn clamp_page(page: usize, total: usize) -> usize {
    page.clamp(1, total.max(1))
}

/// Index range of the rows shown on `page` (1-based, already clamped)
pub fn page_range(page: usize, page_size: usize, row_count: usize) -> Range<usize> {
    let page_size = page_size.max(1);
    let start = (page.max(1) - 1).saturating_mul(page_size).min(row_count);
    let end = start.saturating_add(page_size).min(row_count);
    start..end
}
