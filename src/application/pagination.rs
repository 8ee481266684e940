//! Offset pagination for list endpoints.

use serde::Deserialize;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// 1-based page request. Missing or zero values fall back to defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    pub fn page(&self) -> u32 {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .min(MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginated<T> {
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
    pub items: Vec<T>,
}

impl<T> Paginated<T> {
    /// Wrap one page already fetched from a store that reported `total`.
    pub fn from_page(items: Vec<T>, total: u64, params: &PageParams) -> Self {
        Self {
            total,
            page: params.page(),
            total_pages: total.div_ceil(u64::from(params.limit())),
            items,
        }
    }

    /// Slice one page out of a fully materialized list.
    pub fn slice(all: &[T], params: &PageParams) -> Self
    where
        T: Clone,
    {
        let total = all.len() as u64;
        let start = usize::try_from(params.offset()).unwrap_or(usize::MAX);
        let items = all
            .iter()
            .skip(start)
            .take(params.limit() as usize)
            .cloned()
            .collect();
        Self::from_page(items, total, params)
    }
}
