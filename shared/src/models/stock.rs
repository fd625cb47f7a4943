//! Warehouse stock (stok gudang) models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one warehouse stock row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StockKey {
    pub item_id: Uuid,
    pub warehouse_id: Uuid,
}

impl StockKey {
    pub fn new(item_id: Uuid, warehouse_id: Uuid) -> Self {
        Self {
            item_id,
            warehouse_id,
        }
    }
}

/// A signed quantity change for one warehouse stock row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockDelta {
    pub key: StockKey,
    pub quantity: i64,
    /// Bin location to record on the stock row, if the movement names one
    pub shelf_code_id: Option<Uuid>,
}

impl StockDelta {
    pub fn new(item_id: Uuid, warehouse_id: Uuid, quantity: i64) -> Self {
        Self {
            key: StockKey::new(item_id, warehouse_id),
            quantity,
            shelf_code_id: None,
        }
    }

    pub fn with_shelf(mut self, shelf_code_id: Option<Uuid>) -> Self {
        self.shelf_code_id = shelf_code_id;
        self
    }

    /// The delta that undoes this one
    pub fn reversed(&self) -> Self {
        Self {
            key: self.key,
            quantity: -self.quantity,
            shelf_code_id: None,
        }
    }
}
