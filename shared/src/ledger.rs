//! Stock ledger: translating movement documents into stock deltas
//!
//! Every movement document is reduced to a list of signed deltas per
//! `(item, warehouse)`. Deltas are consolidated before they are applied so
//! each stock row is touched once per transaction, in a stable key order.

use std::collections::BTreeMap;

use thiserror::Error;
use uuid::Uuid;

use crate::models::{CountedLine, MovementLineInput, StockDelta, StockKey};

/// Ledger rule violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("stock quantity overflow")]
    Overflow,
}

/// Deltas for goods received into `warehouse_id`
pub fn inbound_deltas(warehouse_id: Uuid, lines: &[MovementLineInput]) -> Vec<StockDelta> {
    lines
        .iter()
        .map(|l| {
            StockDelta::new(l.item_id, warehouse_id, i64::from(l.quantity)).with_shelf(l.shelf_code_id)
        })
        .collect()
}

/// Deltas for goods shipped out of `warehouse_id`
pub fn outbound_deltas(warehouse_id: Uuid, lines: &[MovementLineInput]) -> Vec<StockDelta> {
    lines
        .iter()
        .map(|l| StockDelta::new(l.item_id, warehouse_id, -i64::from(l.quantity)))
        .collect()
}

/// Deltas for goods moved from `source_id` to `destination_id`
pub fn transfer_deltas(
    source_id: Uuid,
    destination_id: Uuid,
    lines: &[MovementLineInput],
) -> Vec<StockDelta> {
    lines
        .iter()
        .flat_map(|l| {
            let qty = i64::from(l.quantity);
            [
                StockDelta::new(l.item_id, source_id, -qty),
                StockDelta::new(l.item_id, destination_id, qty),
            ]
        })
        .collect()
}

/// Deltas that bring each counted row to its counted quantity
pub fn count_deltas(warehouse_id: Uuid, lines: &[CountedLine]) -> Vec<StockDelta> {
    lines
        .iter()
        .map(|l| StockDelta::new(l.item_id, warehouse_id, l.difference()))
        .collect()
}

/// Deltas that undo `deltas`
pub fn reverse(deltas: &[StockDelta]) -> Vec<StockDelta> {
    deltas.iter().map(StockDelta::reversed).collect()
}

/// Merge deltas on the same stock row, drop no-ops and sort by key
///
/// A delta whose quantity nets to zero is still kept when it carries a
/// shelf assignment.
pub fn consolidate(deltas: impl IntoIterator<Item = StockDelta>) -> Vec<StockDelta> {
    let mut merged: BTreeMap<StockKey, StockDelta> = BTreeMap::new();

    for delta in deltas {
        merged
            .entry(delta.key)
            .and_modify(|existing| {
                existing.quantity += delta.quantity;
                if delta.shelf_code_id.is_some() {
                    existing.shelf_code_id = delta.shelf_code_id;
                }
            })
            .or_insert(delta);
    }

    merged
        .into_values()
        .filter(|d| d.quantity != 0 || d.shelf_code_id.is_some())
        .collect()
}

/// Apply a delta to a current quantity, refusing to go below zero
pub fn apply_delta(current: i64, delta: i64) -> Result<i64, LedgerError> {
    let next = current.checked_add(delta).ok_or(LedgerError::Overflow)?;
    if next < 0 {
        return Err(LedgerError::InsufficientStock {
            available: current,
            requested: -delta,
        });
    }
    if next > i64::from(i32::MAX) {
        return Err(LedgerError::Overflow);
    }
    Ok(next)
}

/// Net quantity change per stock row, for summaries and checks
pub fn net_by_key(deltas: &[StockDelta]) -> BTreeMap<StockKey, i64> {
    let mut totals = BTreeMap::new();
    for d in deltas {
        *totals.entry(d.key).or_insert(0) += d.quantity;
    }
    totals
}

/// Running balance over a chronological list of signed quantities
pub fn running_balance(opening: i64, movements: &[i64]) -> Vec<i64> {
    movements
        .iter()
        .scan(opening, |balance, qty| {
            *balance += qty;
            Some(*balance)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (Uuid, Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn test_inbound_adds_quantity() {
        let (item, wh, _) = ids();
        let deltas = inbound_deltas(wh, &[MovementLineInput::new(item, 5)]);
        assert_eq!(deltas, vec![StockDelta::new(item, wh, 5)]);
    }

    #[test]
    fn test_outbound_subtracts_quantity() {
        let (item, wh, _) = ids();
        let deltas = outbound_deltas(wh, &[MovementLineInput::new(item, 7)]);
        assert_eq!(deltas[0].quantity, -7);
    }

    #[test]
    fn test_transfer_moves_between_warehouses() {
        let (item, src, dst) = ids();
        let deltas = transfer_deltas(src, dst, &[MovementLineInput::new(item, 3)]);
        let net = net_by_key(&deltas);
        assert_eq!(net[&StockKey::new(item, src)], -3);
        assert_eq!(net[&StockKey::new(item, dst)], 3);
    }

    #[test]
    fn test_count_brings_stock_to_counted() {
        let (item, wh, _) = ids();
        let line = CountedLine {
            item_id: item,
            system_quantity: 10,
            counted_quantity: 8,
        };
        let deltas = count_deltas(wh, &[line]);
        assert_eq!(apply_delta(10, deltas[0].quantity), Ok(8));
    }

    #[test]
    fn test_consolidate_merges_and_drops_zero() {
        let (item, wh, other) = ids();
        let deltas = vec![
            StockDelta::new(item, wh, 4),
            StockDelta::new(item, wh, -4),
            StockDelta::new(other, wh, 2),
            StockDelta::new(other, wh, 1),
        ];
        let merged = consolidate(deltas);
        assert_eq!(merged, vec![StockDelta::new(other, wh, 3)]);
    }

    #[test]
    fn test_consolidate_keeps_shelf_assignment() {
        let (item, wh, shelf) = ids();
        let merged = consolidate(vec![
            StockDelta::new(item, wh, 2).with_shelf(Some(shelf)),
            StockDelta::new(item, wh, -2),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].quantity, 0);
        assert_eq!(merged[0].shelf_code_id, Some(shelf));
    }

    #[test]
    fn test_consolidate_sorts_by_key() {
        let wh = Uuid::new_v4();
        let mut items: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let deltas: Vec<StockDelta> = items.iter().map(|i| StockDelta::new(*i, wh, 1)).collect();
        let merged = consolidate(deltas);
        items.sort();
        let merged_items: Vec<Uuid> = merged.iter().map(|d| d.key.item_id).collect();
        assert_eq!(merged_items, items);
    }

    #[test]
    fn test_apply_delta_rejects_negative_stock() {
        assert_eq!(
            apply_delta(5, -6),
            Err(LedgerError::InsufficientStock {
                available: 5,
                requested: 6
            })
        );
        assert_eq!(apply_delta(5, -5), Ok(0));
    }

    #[test]
    fn test_reverse_undoes_deltas() {
        let (item, src, dst) = ids();
        let deltas = transfer_deltas(src, dst, &[MovementLineInput::new(item, 9)]);
        let mut all = deltas.clone();
        all.extend(reverse(&deltas));
        assert!(consolidate(all).is_empty());
    }

    #[test]
    fn test_running_balance() {
        assert_eq!(running_balance(10, &[5, -3, -12]), vec![15, 12, 0]);
        assert!(running_balance(0, &[]).is_empty());
    }
}
