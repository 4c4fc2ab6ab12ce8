//! Page math shared by CMS listings and local lists (cities).

use serde::{Deserialize, Serialize};

/// Pagination metadata in the shape the CMS reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
    pub total: u64,
}

impl Pagination {
    /// Default page size when a caller does not ask for one.
    pub const DEFAULT_PAGE_SIZE: u32 = 24;
    /// Upper bound on page size (the CMS caps at 100 as well).
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Normalise user-supplied page parameters: page ≥ 1, page size in
    /// `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn clamp_params(page: Option<u32>, page_size: Option<u32>) -> (u32, u32) {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size
            .unwrap_or(Self::DEFAULT_PAGE_SIZE)
            .clamp(1, Self::MAX_PAGE_SIZE);
        (page, page_size)
    }

    /// Build pagination for a list of `total` items.
    #[must_use]
    pub fn from_total(page: u32, page_size: u32, total: u64) -> Self {
        let (page, page_size) = Self::clamp_params(Some(page), Some(page_size));
        let page_count = u32::try_from(total.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX);
        Self {
            page,
            page_size,
            page_count,
            total,
        }
    }

    /// Index of the first item on this page.
    #[must_use]
    pub fn offset(&self) -> usize {
        let offset = u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size);
        usize::try_from(offset).unwrap_or(usize::MAX)
    }

    /// Whether items exist past this page.
    #[must_use]
    pub fn has_more(&self) -> bool {
        u64::from(self.page) * u64::from(self.page_size) < self.total
    }

    /// Slice out the items belonging to this page.
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset().min(items.len());
        let end = start.saturating_add(self.page_size as usize).min(items.len());
        items.get(start..end).unwrap_or(&[])
    }
}
