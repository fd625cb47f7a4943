//! Business logic services for the Warehouse Management System

pub mod auth;
pub mod dashboard;
pub mod export;
pub mod import;
pub mod inbound;
pub mod item;
pub mod numbering;
pub mod outbound;
pub mod partner;
pub mod shelf_code;
pub mod spreadsheet;
pub mod stock;
pub mod stock_count;
pub mod transfer;
pub mod user;
pub mod warehouse;

pub use auth::AuthService;
pub use dashboard::DashboardService;
pub use export::ExportService;
pub use import::ImportService;
pub use inbound::InboundService;
pub use item::ItemService;
pub use outbound::OutboundService;
pub use partner::{PartnerKind, PartnerService};
pub use shelf_code::ShelfCodeService;
pub use stock::StockService;
pub use stock_count::StockCountService;
pub use transfer::TransferService;
pub use user::UserService;
pub use warehouse::WarehouseService;

use serde::Deserialize;
use shared::types::{DateRange, Pagination};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Map a `shared` validation result onto a field error
pub(crate) fn check(field: &str, result: Result<(), &'static str>) -> AppResult<()> {
    result.map_err(|message| AppError::validation(field, message))
}

/// `ILIKE` pattern for a free-text search, `None` when the search is blank
pub(crate) fn like_pattern(q: Option<&str>) -> Option<String> {
    let q = q.map(str::trim).filter(|q| !q.is_empty())?;
    let escaped = q
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{}%", escaped))
}

/// Trim an optional text field, treating blank input as absent
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Search and paging parameters shared by master-data lists
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl SearchQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::from_query(self.page, self.per_page)
    }
}

/// Filters for movement document lists
#[derive(Debug, Default, Deserialize)]
pub struct MovementQuery {
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
    pub warehouse_id: Option<Uuid>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl MovementQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::from_query(self.page, self.per_page)
    }

    pub fn date_range(&self) -> AppResult<DateRange> {
        DateRange::new(self.start_date, self.end_date)
            .map_err(|message| AppError::validation("start_date", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern(Some("  ")), None);
        assert_eq!(like_pattern(None), None);
        assert_eq!(like_pattern(Some("baut")), Some("%baut%".to_string()));
        assert_eq!(like_pattern(Some("50%_off")), Some("%50\\%\\_off%".to_string()));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Jakarta ".into())), Some("Jakarta".to_string()));
        assert_eq!(non_blank(Some("   ".into())), None);
    }

    #[test]
    fn test_movement_query_rejects_inverted_range() {
        let query = MovementQuery {
            start_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 30),
            end_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 1),
            ..Default::default()
        };
        assert!(query.date_range().is_err());
    }
}
