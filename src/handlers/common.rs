use crate::{config::AppConfig, services::Page, PaginatedResponse};
use serde::{Deserialize, Serialize};

/// Pagination parameters for list operations
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PaginationParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl PaginationParams {
    /// 1-based page and a page size clamped to the configured bounds.
    pub fn resolve(&self, config: &AppConfig) -> (u64, u64) {
        (self.page.unwrap_or(1).max(1), config.page_size(self.per_page))
    }
}

impl<T> From<Page<T>> for PaginatedResponse<T> {
    fn from(page: Page<T>) -> Self {
        PaginatedResponse::new(page.items, page.total, page.page, page.per_page)
    }
}

/// `year`/`month` path segments shared by the monthly reports.
#[derive(Debug, Deserialize)]
pub struct MonthPath {
    pub year: i32,
    pub month: u32,
}
