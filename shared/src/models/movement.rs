//! Stock movement documents: inbound, outbound, transfer and stock count

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of stock movement document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Stok masuk: goods received into a warehouse
    Inbound,
    /// Stok keluar: goods shipped out of a warehouse
    Outbound,
    /// Transfer gudang: goods moved between two warehouses
    Transfer,
    /// Stok opname: physical count reconciliation
    StockCount,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Inbound,
        DocumentKind::Outbound,
        DocumentKind::Transfer,
        DocumentKind::StockCount,
    ];

    /// Prefix code used in document numbers (e.g. `SM-0625-0001`)
    pub fn code(&self) -> &'static str {
        match self {
            DocumentKind::Inbound => "SM",
            DocumentKind::Outbound => "SK",
            DocumentKind::Transfer => "TG",
            DocumentKind::StockCount => "SO",
        }
    }

    /// Header table holding documents of this kind
    pub fn table_name(&self) -> &'static str {
        match self {
            DocumentKind::Inbound => "inbound_transactions",
            DocumentKind::Outbound => "outbound_transactions",
            DocumentKind::Transfer => "transfers",
            DocumentKind::StockCount => "stock_counts",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Inbound => "inbound",
            DocumentKind::Outbound => "outbound",
            DocumentKind::Transfer => "transfer",
            DocumentKind::StockCount => "stock_count",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Inbound => write!(f, "Inbound"),
            DocumentKind::Outbound => write!(f, "Outbound"),
            DocumentKind::Transfer => write!(f, "Transfer"),
            DocumentKind::StockCount => write!(f, "Stock Count"),
        }
    }
}

/// A line on an inbound, outbound or transfer document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovementLineInput {
    pub item_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    /// Bin location in the receiving warehouse (inbound only)
    #[serde(default)]
    pub shelf_code_id: Option<Uuid>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl MovementLineInput {
    pub fn new(item_id: Uuid, quantity: i32) -> Self {
        Self {
            item_id,
            quantity,
            unit_price: None,
            shelf_code_id: None,
            notes: None,
        }
    }

    /// Line total when a unit price is known
    pub fn total_price(&self) -> Option<Decimal> {
        self.unit_price.map(|p| p * Decimal::from(self.quantity))
    }
}

/// A counted line on a stock count document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountLineInput {
    pub item_id: Uuid,
    pub counted_quantity: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A count line after the system quantity has been snapshotted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountedLine {
    pub item_id: Uuid,
    pub system_quantity: i64,
    pub counted_quantity: i64,
}

impl CountedLine {
    /// Signed adjustment needed to bring stock to the counted quantity
    pub fn difference(&self) -> i64 {
        self.counted_quantity - self.system_quantity
    }
}
