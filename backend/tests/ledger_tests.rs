//! Stock ledger tests
//!
//! Tests for the movement-to-stock translation:
//! - Stock never goes below zero
//! - Creating then deleting a document restores stock exactly
//! - Stock equals the signed sum of all documents

use std::collections::BTreeMap;

use proptest::prelude::*;
use shared::ledger::{self, LedgerError};
use shared::models::{CountedLine, MovementLineInput, StockDelta, StockKey};
use uuid::Uuid;

type Stock = BTreeMap<StockKey, i64>;

/// Apply deltas all-or-nothing, the way one database transaction does
fn apply(stock: &mut Stock, deltas: Vec<StockDelta>) -> Result<(), LedgerError> {
    let mut next = stock.clone();
    for delta in ledger::consolidate(deltas) {
        let current = next.get(&delta.key).copied().unwrap_or(0);
        let updated = ledger::apply_delta(current, delta.quantity)?;
        next.insert(delta.key, updated);
    }
    *stock = next;
    Ok(())
}

fn line(item_id: Uuid, quantity: i32) -> MovementLineInput {
    MovementLineInput::new(item_id, quantity)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_inbound_then_outbound() {
        let (item, gudang) = (Uuid::new_v4(), Uuid::new_v4());
        let mut stock = Stock::new();

        apply(&mut stock, ledger::inbound_deltas(gudang, &[line(item, 10)])).unwrap();
        apply(&mut stock, ledger::outbound_deltas(gudang, &[line(item, 4)])).unwrap();

        assert_eq!(stock[&StockKey::new(item, gudang)], 6);
    }

    #[test]
    fn test_outbound_beyond_stock_changes_nothing() {
        let (item, other, gudang) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut stock = Stock::new();
        apply(
            &mut stock,
            ledger::inbound_deltas(gudang, &[line(item, 5), line(other, 5)]),
        )
        .unwrap();
        let before = stock.clone();

        let err = apply(
            &mut stock,
            ledger::outbound_deltas(gudang, &[line(other, 1), line(item, 6)]),
        )
        .unwrap_err();

        assert_eq!(
            err,
            LedgerError::InsufficientStock {
                available: 5,
                requested: 6
            }
        );
        assert_eq!(stock, before);
    }

    #[test]
    fn test_transfer_moves_between_warehouses() {
        let (item, utama, cabang) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut stock = Stock::new();
        apply(&mut stock, ledger::inbound_deltas(utama, &[line(item, 8)])).unwrap();

        apply(&mut stock, ledger::transfer_deltas(utama, cabang, &[line(item, 3)])).unwrap();

        assert_eq!(stock[&StockKey::new(item, utama)], 5);
        assert_eq!(stock[&StockKey::new(item, cabang)], 3);
    }

    #[test]
    fn test_count_sets_counted_quantity() {
        let (item, gudang) = (Uuid::new_v4(), Uuid::new_v4());
        let mut stock = Stock::new();
        apply(&mut stock, ledger::inbound_deltas(gudang, &[line(item, 12)])).unwrap();

        let counted = CountedLine {
            item_id: item,
            system_quantity: 12,
            counted_quantity: 9,
        };
        apply(&mut stock, ledger::count_deltas(gudang, &[counted])).unwrap();
        assert_eq!(stock[&StockKey::new(item, gudang)], 9);

        apply(&mut stock, ledger::reverse(&ledger::count_deltas(gudang, &[counted]))).unwrap();
        assert_eq!(stock[&StockKey::new(item, gudang)], 12);
    }

    #[test]
    fn test_deleting_consumed_inbound_fails() {
        let (item, gudang) = (Uuid::new_v4(), Uuid::new_v4());
        let mut stock = Stock::new();
        let inbound = ledger::inbound_deltas(gudang, &[line(item, 10)]);
        apply(&mut stock, inbound.clone()).unwrap();
        apply(&mut stock, ledger::outbound_deltas(gudang, &[line(item, 7)])).unwrap();

        assert!(apply(&mut stock, ledger::reverse(&inbound)).is_err());
        assert_eq!(stock[&StockKey::new(item, gudang)], 3);
    }

    #[test]
    fn test_update_merges_reverse_and_new() {
        let (item, gudang) = (Uuid::new_v4(), Uuid::new_v4());
        let old = ledger::outbound_deltas(gudang, &[line(item, 5)]);
        let new = ledger::outbound_deltas(gudang, &[line(item, 7)]);

        let merged = ledger::consolidate(ledger::reverse(&old).into_iter().chain(new));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].quantity, -2);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[derive(Debug, Clone)]
enum Movement {
    Inbound { item: usize, warehouse: usize, qty: i32 },
    Outbound { item: usize, warehouse: usize, qty: i32 },
    Transfer { item: usize, from: usize, to: usize, qty: i32 },
}

#[cfg(test)]
mod property_tests {
    use super::*;

    const ITEMS: usize = 3;
    const WAREHOUSES: usize = 2;

    fn movement_strategy() -> impl Strategy<Value = Movement> {
        prop_oneof![
            (0..ITEMS, 0..WAREHOUSES, 1i32..=50)
                .prop_map(|(item, warehouse, qty)| Movement::Inbound { item, warehouse, qty }),
            (0..ITEMS, 0..WAREHOUSES, 1i32..=50)
                .prop_map(|(item, warehouse, qty)| Movement::Outbound { item, warehouse, qty }),
            (0..ITEMS, 0..WAREHOUSES, 1i32..=50).prop_map(|(item, from, qty)| {
                Movement::Transfer {
                    item,
                    from,
                    to: (from + 1) % WAREHOUSES,
                    qty,
                }
            }),
        ]
    }

    fn deltas(m: &Movement, items: &[Uuid], warehouses: &[Uuid]) -> Vec<StockDelta> {
        match *m {
            Movement::Inbound { item, warehouse, qty } => {
                ledger::inbound_deltas(warehouses[warehouse], &[line(items[item], qty)])
            }
            Movement::Outbound { item, warehouse, qty } => {
                ledger::outbound_deltas(warehouses[warehouse], &[line(items[item], qty)])
            }
            Movement::Transfer { item, from, to, qty } => {
                ledger::transfer_deltas(warehouses[from], warehouses[to], &[line(items[item], qty)])
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Accepted documents keep every row non-negative and the totals
        /// equal the signed sum of the accepted documents
        #[test]
        fn prop_stock_matches_accepted_documents(
            movements in prop::collection::vec(movement_strategy(), 1..40)
        ) {
            let items: Vec<Uuid> = (0..ITEMS).map(|_| Uuid::new_v4()).collect();
            let warehouses: Vec<Uuid> = (0..WAREHOUSES).map(|_| Uuid::new_v4()).collect();
            let mut stock = Stock::new();
            let mut accepted: Vec<StockDelta> = Vec::new();

            for m in &movements {
                let d = deltas(m, &items, &warehouses);
                if apply(&mut stock, d.clone()).is_ok() {
                    accepted.extend(d);
                }
                prop_assert!(stock.values().all(|q| *q >= 0));
            }

            let expected = ledger::net_by_key(&accepted);
            for (key, qty) in &stock {
                prop_assert_eq!(*qty, expected.get(key).copied().unwrap_or(0));
            }
        }

        /// Create followed by delete of the same document is a no-op
        #[test]
        fn prop_create_delete_roundtrip(
            opening in 0i64..100,
            m in movement_strategy()
        ) {
            let items: Vec<Uuid> = (0..ITEMS).map(|_| Uuid::new_v4()).collect();
            let warehouses: Vec<Uuid> = (0..WAREHOUSES).map(|_| Uuid::new_v4()).collect();
            let mut stock = Stock::new();
            for item in &items {
                for warehouse in &warehouses {
                    stock.insert(StockKey::new(*item, *warehouse), opening);
                }
            }
            let before = stock.clone();

            let d = deltas(&m, &items, &warehouses);
            if apply(&mut stock, d.clone()).is_ok() {
                apply(&mut stock, ledger::reverse(&d)).unwrap();
            }
            prop_assert_eq!(stock, before);
        }

        /// Consolidation keeps the per-row net and yields sorted unique keys
        #[test]
        fn prop_consolidate_preserves_net(
            raw in prop::collection::vec((0usize..4, -20i64..20), 0..30)
        ) {
            let item = Uuid::new_v4();
            let warehouses: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
            let deltas: Vec<StockDelta> = raw
                .iter()
                .map(|(w, q)| StockDelta::new(item, warehouses[*w], *q))
                .collect();

            let consolidated = ledger::consolidate(deltas.clone());
            let net = ledger::net_by_key(&deltas);

            prop_assert!(consolidated.windows(2).all(|w| w[0].key < w[1].key));
            prop_assert!(consolidated.iter().all(|d| d.quantity != 0));
            for d in &consolidated {
                prop_assert_eq!(Some(&d.quantity), net.get(&d.key));
            }
        }

        /// The final running balance equals opening plus the sum of movements
        #[test]
        fn prop_running_balance_ends_at_sum(
            opening in 0i64..1000,
            moves in prop::collection::vec(-50i64..50, 0..50)
        ) {
            let balances = ledger::running_balance(opening, &moves);
            prop_assert_eq!(balances.len(), moves.len());
            let last = balances.last().copied().unwrap_or(opening);
            prop_assert_eq!(last, opening + moves.iter().sum::<i64>());
        }
    }
}
