//! Offset pagination helpers.

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// A 1-based page number plus page size, clamped to supported bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, per: Option<u32>) -> Self {
        let page = page.unwrap_or(DEFAULT_PAGE).max(1);
        let per = per.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        Self { page, per }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per(&self) -> u32 {
        self.per
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}
