//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Upper bound for `per_page` on every list endpoint
pub const MAX_PER_PAGE: u32 = 100;

/// Pagination parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    /// Build pagination from optional query values, clamping out-of-range input
    pub fn from_query(page: Option<u32>, per_page: Option<u32>) -> Self {
        let defaults = Self::default();
        Self {
            page: page.unwrap_or(defaults.page).max(1),
            per_page: per_page.unwrap_or(defaults.per_page).clamp(1, MAX_PER_PAGE),
        }
    }

    /// Row offset for SQL `OFFSET`
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }

    /// Row limit for SQL `LIMIT`
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, pagination: Pagination, total_items: i64) -> Self {
        let total_items = total_items.max(0) as u64;
        let per_page = u64::from(pagination.per_page.max(1));
        let total_pages = total_items.div_ceil(per_page) as u32;

        Self {
            data,
            pagination: PaginationMeta {
                page: pagination.page,
                per_page: pagination.per_page,
                total_items,
                total_pages,
            },
        }
    }
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

/// Optional, inclusive date range for list and report filters
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<chrono::NaiveDate>,
    pub end: Option<chrono::NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<chrono::NaiveDate>, end: Option<chrono::NaiveDate>) -> Result<Self, &'static str> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err("Start date must not be after end date");
            }
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: chrono::NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_input() {
        let p = Pagination::from_query(Some(0), Some(1000));
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, MAX_PER_PAGE);

        let p = Pagination::from_query(None, Some(0));
        assert_eq!(p.per_page, 1);
    }

    #[test]
    fn pagination_offset() {
        let p = Pagination::from_query(Some(3), Some(25));
        assert_eq!(p.offset(), 50);
        assert_eq!(p.limit(), 25);
    }

    #[test]
    fn paginated_response_counts_pages() {
        let response = PaginatedResponse::new(vec![1, 2, 3], Pagination::from_query(Some(1), Some(20)), 41);
        assert_eq!(response.pagination.total_pages, 3);
        assert_eq!(response.pagination.total_items, 41);

        let empty: PaginatedResponse<i32> = PaginatedResponse::new(vec![], Pagination::default(), 0);
        assert_eq!(empty.pagination.total_pages, 0);
    }

    #[test]
    fn date_range_rejects_inverted_bounds() {
        let jan = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let feb = chrono::NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert!(DateRange::new(Some(feb), Some(jan)).is_err());

        let range = DateRange::new(Some(jan), None).unwrap();
        assert!(range.contains(feb));
        assert!(!range.contains(jan.pred_opt().unwrap()));
        assert!(DateRange::default().contains(jan));
    }
}
