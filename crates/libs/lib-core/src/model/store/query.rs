//! # Wire List Query
//!
//! Paging and status-filter parameters for owner-scoped wire listings.
//!
//! A status that does not name one of the four known values is dropped, so
//! `?status=bogus` lists exactly what an unfiltered request lists.

use crate::error::{AppError, FieldError, Result};

use super::models::WireStatus;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireQuery {
    page: u32,
    page_size: u32,
    status: Option<WireStatus>,
}

impl Default for WireQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            status: None,
        }
    }
}

impl WireQuery {
    /// Build a query, defaulting missing paging values and validating the rest.
    pub fn new(page: Option<u32>, page_size: Option<u32>, status: Option<&str>) -> Result<Self> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        let mut errors = Vec::new();
        if page < 1 {
            errors.push(FieldError::new("page", "must be greater than or equal to 1"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            errors.push(FieldError::new(
                "page_size",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        Ok(Self {
            page,
            page_size,
            status: status.and_then(|s| s.parse().ok()),
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Effective filter after dropping unknown values.
    pub fn status(&self) -> Option<WireStatus> {
        self.status
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    /// Status segment of a cache key.
    pub fn status_label(&self) -> &'static str {
        self.status.map(|s| s.as_str()).unwrap_or("all")
    }
}
