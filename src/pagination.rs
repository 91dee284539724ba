use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

/// `?page=&per_page=` as sent by the dashboard and the JSON listing.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Position of one page within a listing of `total` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    /// Out-of-range pages land on the nearest valid one; an empty listing
    /// still has a single (empty) page.
    pub fn new(requested_page: Option<u32>, per_page: Option<u32>, total: u64) -> Self {
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let total_pages = total.div_ceil(u64::from(per_page)).max(1);
        let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);
        let page = requested_page.unwrap_or(1).clamp(1, total_pages);

        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }

    pub fn from_request(request: PageRequest, total: u64) -> Self {
        Self::new(request.page, request.per_page, total)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }

    pub fn prev_page(&self) -> Option<u32> {
        (self.page > 1).then(|| self.page - 1)
    }

    pub fn next_page(&self) -> Option<u32> {
        (self.page < self.total_pages).then(|| self.page + 1)
    }
}
