//! Spreadsheet imports
//!
//! An upload is decoded, parsed against the kind's column schema and then
//! replayed through the same insert paths the forms use, all in one
//! transaction. Any row error rejects the whole file.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use shared::import::{
    group_inbound, parse_inbound, parse_items, parse_partners, parse_warehouses, ImportKind,
    InboundGroup, RowError,
};
use shared::models::{DocumentKind, MovementLineInput};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::config::ImportConfig;
use crate::error::{AppError, AppResult};
use crate::services::inbound::InboundInput;
use crate::services::item::CreateItemInput;
use crate::services::partner::PartnerInput;
use crate::services::{numbering, spreadsheet};
use crate::services::warehouse::CreateWarehouseInput;
use crate::services::{InboundService, ItemService, PartnerKind, PartnerService, WarehouseService};

#[derive(Clone)]
pub struct ImportService {
    db: PgPool,
    max_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub kind: ImportKind,
    pub created: usize,
    pub skipped: usize,
    pub errors: Vec<RowError>,
}

impl ImportSummary {
    fn new(kind: ImportKind) -> Self {
        Self {
            kind,
            created: 0,
            skipped: 0,
            errors: Vec::new(),
        }
    }
}

/// Turn a field validation failure into a row error; anything else aborts
fn row_error(row: usize, err: AppError) -> Result<RowError, AppError> {
    match err {
        AppError::Validation { field, message, .. } => Ok(RowError::new(row, Some(&field), message)),
        AppError::ValidationError(message) => Ok(RowError::new(row, None, message)),
        other => Err(other),
    }
}

impl ImportService {
    pub fn new(db: PgPool, config: &ImportConfig) -> Self {
        Self {
            db,
            max_rows: config.max_rows,
        }
    }

    pub async fn import(
        &self,
        kind: ImportKind,
        user_id: Uuid,
        file_name: Option<&str>,
        bytes: &[u8],
    ) -> AppResult<ImportSummary> {
        let table = spreadsheet::decode_upload(file_name, bytes)?;
        if table.data_row_count() > self.max_rows {
            return Err(AppError::Validation {
                field: "file".to_string(),
                message: format!("The file has more than {} data rows", self.max_rows),
                message_id: format!("Berkas berisi lebih dari {} baris data", self.max_rows),
            });
        }

        let mut tx = self.db.begin().await?;
        let mut summary = ImportSummary::new(kind);

        let errors = match kind {
            ImportKind::Items => {
                let rows = parse_items(&table).map_err(AppError::ImportFailed)?;
                let existing = lowered(ItemService::existing_codes(&mut tx).await?);
                let (rows, skipped) = partition_new(rows, &existing, |r| r.code.as_str());
                summary.skipped = skipped;
                let mut errors = Vec::new();
                for row in rows {
                    let input = CreateItemInput {
                        code: row.code,
                        name: row.name,
                        category: row.category,
                        unit: row.unit,
                        description: row.description,
                        min_stock: Some(row.min_stock),
                    };
                    match ItemService::insert(&mut tx, input).await {
                        Ok(_) => summary.created += 1,
                        Err(e) => errors.push(row_error(row.row, e)?),
                    }
                }
                errors
            }
            ImportKind::Suppliers | ImportKind::Customers => {
                let partner_kind = if kind == ImportKind::Suppliers {
                    PartnerKind::Supplier
                } else {
                    PartnerKind::Customer
                };
                let rows = parse_partners(kind, &table).map_err(AppError::ImportFailed)?;
                let existing = lowered(PartnerService::existing_names(&mut tx, partner_kind).await?);
                let (rows, skipped) = partition_new(rows, &existing, |r| r.name.as_str());
                summary.skipped = skipped;
                let mut errors = Vec::new();
                for row in rows {
                    let input = PartnerInput {
                        name: row.name,
                        contact_person: row.contact_person,
                        phone: row.phone,
                        email: row.email,
                        address: row.address,
                        notes: row.notes,
                    };
                    match PartnerService::insert(&mut tx, partner_kind, input).await {
                        Ok(_) => summary.created += 1,
                        Err(e) => errors.push(row_error(row.row, e)?),
                    }
                }
                errors
            }
            ImportKind::Warehouses => {
                let rows = parse_warehouses(&table).map_err(AppError::ImportFailed)?;
                let existing = lowered(WarehouseService::existing_codes(&mut tx).await?);
                let (rows, skipped) = partition_new(rows, &existing, |r| r.code.as_str());
                summary.skipped = skipped;
                let mut errors = Vec::new();
                for row in rows {
                    let input = CreateWarehouseInput {
                        code: row.code,
                        name: row.name,
                        address: row.address,
                        description: row.description,
                    };
                    match WarehouseService::insert(&mut tx, input).await {
                        Ok(_) => summary.created += 1,
                        Err(e) => errors.push(row_error(row.row, e)?),
                    }
                }
                errors
            }
            ImportKind::Inbound => {
                let rows = parse_inbound(&table).map_err(AppError::ImportFailed)?;
                self.import_inbound(&mut tx, user_id, group_inbound(rows), &mut summary)
                    .await?
            }
        };

        if !errors.is_empty() {
            return Err(AppError::ImportFailed(errors));
        }

        tx.commit().await?;
        tracing::info!(
            kind = kind.as_str(),
            created = summary.created,
            skipped = summary.skipped,
            "Import completed"
        );
        Ok(summary)
    }

    /// Resolve names for every group first, then record one inbound per group
    async fn import_inbound(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        groups: Vec<InboundGroup>,
        summary: &mut ImportSummary,
    ) -> AppResult<Vec<RowError>> {
        let items: HashMap<String, Uuid> = ItemService::existing_codes(conn)
            .await?
            .into_iter()
            .map(|(id, code)| (code, id))
            .collect();
        let suppliers: HashMap<String, Uuid> =
            PartnerService::existing_names(conn, PartnerKind::Supplier)
                .await?
                .into_iter()
                .map(|(id, name)| (name, id))
                .collect();

        let mut errors = Vec::new();
        let mut inputs = Vec::new();

        for group in &groups {
            let warehouse_id = WarehouseService::find_by_code_or_name(conn, &group.warehouse).await?;
            match resolve_group(group, warehouse_id, &items, &suppliers) {
                Ok(input) => inputs.push((group_first_row(group), input)),
                Err(mut group_errors) => errors.append(&mut group_errors),
            }
        }

        if !errors.is_empty() {
            return Ok(errors);
        }

        numbering::lock_months(
            conn,
            DocumentKind::Inbound,
            inputs.iter().map(|(_, input)| input.transaction_date),
        )
        .await?;

        for (first_row, input) in inputs {
            match InboundService::create_in(conn, user_id, &input).await {
                Ok((_, number)) => {
                    tracing::debug!(document_number = %number, "Imported inbound document");
                    summary.created += 1;
                }
                Err(e) => errors.push(row_error(first_row, e)?),
            }
        }
        Ok(errors)
    }
}

fn lowered(rows: Vec<(Uuid, String)>) -> HashSet<String> {
    rows.into_iter().map(|(_, key)| key).collect()
}

/// Rows whose key is not in `existing` (lower-cased), plus the skipped count
fn partition_new<T>(
    rows: Vec<T>,
    existing: &HashSet<String>,
    key: impl Fn(&T) -> &str,
) -> (Vec<T>, usize) {
    let (skip, create): (Vec<T>, Vec<T>) = rows
        .into_iter()
        .partition(|row| existing.contains(&key(row).trim().to_lowercase()));
    (create, skip.len())
}

fn group_first_row(group: &InboundGroup) -> usize {
    group.rows.first().map(|r| r.row).unwrap_or(1)
}

/// Resolve a group's names into an inbound, or every row error it has
///
/// `items` and `suppliers` are keyed by lower-cased code and name.
fn resolve_group(
    group: &InboundGroup,
    warehouse_id: Option<Uuid>,
    items: &HashMap<String, Uuid>,
    suppliers: &HashMap<String, Uuid>,
) -> Result<InboundInput, Vec<RowError>> {
    let first_row = group_first_row(group);
    let mut errors = Vec::new();

    if warehouse_id.is_none() {
        errors.push(RowError::new(
            first_row,
            Some("Warehouse"),
            format!("Unknown warehouse '{}'", group.warehouse),
        ));
    }

    let supplier_id = match &group.supplier {
        Some(name) => match suppliers.get(&name.trim().to_lowercase()) {
            Some(id) => Some(*id),
            None => {
                errors.push(RowError::new(
                    first_row,
                    Some("Supplier"),
                    format!("Unknown supplier '{}'", name),
                ));
                None
            }
        },
        None => None,
    };

    let mut lines = Vec::with_capacity(group.rows.len());
    for row in &group.rows {
        match items.get(&row.item_code.trim().to_lowercase()) {
            Some(item_id) => {
                let mut line = MovementLineInput::new(*item_id, row.quantity);
                line.unit_price = row.unit_price;
                lines.push(line);
            }
            None => errors.push(RowError::new(
                row.row,
                Some("Item Code"),
                format!("Unknown item code '{}'", row.item_code),
            )),
        }
    }

    match warehouse_id {
        Some(warehouse_id) if errors.is_empty() => Ok(InboundInput {
            supplier_id,
            warehouse_id,
            transaction_date: group.date,
            reference: Some(group.reference.clone()),
            notes: None,
            lines,
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use shared::import::InboundRow;

    fn keys(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn inbound_row(row: usize, item_code: &str, quantity: i32) -> InboundRow {
        InboundRow {
            row,
            reference: "PO-77".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
            warehouse: "GD-01".to_string(),
            supplier: Some("PT Sinar Jaya".to_string()),
            item_code: item_code.to_string(),
            quantity,
            unit_price: Some(Decimal::new(12500, 0)),
        }
    }

    fn group(rows: Vec<InboundRow>) -> InboundGroup {
        InboundGroup {
            reference: "PO-77".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
            warehouse: "GD-01".to_string(),
            supplier: Some("PT Sinar Jaya".to_string()),
            rows,
        }
    }

    #[test]
    fn test_existing_keys_skipped_case_insensitively() {
        let rows = vec![(2, "BRG-001"), (3, "brg-002"), (4, " Brg-003 "), (5, "BRG-004")];
        let existing = keys(&["brg-001", "brg-002", "brg-003"]);

        let (create, skipped) = partition_new(rows, &existing, |r| r.1);
        assert_eq!(skipped, 3);
        assert_eq!(create, vec![(5, "BRG-004")]);
    }

    #[test]
    fn test_nothing_skipped_against_empty_master() {
        let rows = vec![(2, "Gudang Utama"), (3, "Gudang Timur")];
        let (create, skipped) = partition_new(rows, &HashSet::new(), |r| r.1);
        assert_eq!(skipped, 0);
        assert_eq!(create.len(), 2);
    }

    #[test]
    fn test_group_resolves_names_to_ids() {
        let item = Uuid::new_v4();
        let supplier = Uuid::new_v4();
        let warehouse = Uuid::new_v4();
        let items = HashMap::from([("brg-001".to_string(), item)]);
        let suppliers = HashMap::from([("pt sinar jaya".to_string(), supplier)]);

        let input = resolve_group(
            &group(vec![inbound_row(2, "BRG-001", 10), inbound_row(3, "brg-001", 5)]),
            Some(warehouse),
            &items,
            &suppliers,
        )
        .unwrap();

        assert_eq!(input.warehouse_id, warehouse);
        assert_eq!(input.supplier_id, Some(supplier));
        assert_eq!(input.reference.as_deref(), Some("PO-77"));
        assert_eq!(input.lines.len(), 2);
        assert!(input.lines.iter().all(|l| l.item_id == item));
        assert_eq!(input.lines[0].unit_price, Some(Decimal::new(12500, 0)));
    }

    #[test]
    fn test_unknown_names_reported_with_row_numbers() {
        let items = HashMap::from([("brg-001".to_string(), Uuid::new_v4())]);

        let errors = resolve_group(
            &group(vec![inbound_row(4, "BRG-001", 1), inbound_row(5, "BRG-404", 2)]),
            None,
            &items,
            &HashMap::new(),
        )
        .unwrap_err();

        let found: Vec<(usize, Option<&str>)> =
            errors.iter().map(|e| (e.row, e.column.as_deref())).collect();
        assert_eq!(
            found,
            vec![(4, Some("Warehouse")), (4, Some("Supplier")), (5, Some("Item Code"))]
        );
        assert!(errors[2].message.contains("BRG-404"));
    }

    #[test]
    fn test_group_without_supplier_needs_no_lookup() {
        let item = Uuid::new_v4();
        let items = HashMap::from([("brg-001".to_string(), item)]);
        let mut without_supplier = group(vec![inbound_row(2, "BRG-001", 3)]);
        without_supplier.supplier = None;

        let input = resolve_group(&without_supplier, Some(Uuid::new_v4()), &items, &HashMap::new()).unwrap();
        assert_eq!(input.supplier_id, None);
    }

    #[test]
    fn test_row_error_from_validation() {
        let err = AppError::validation("phone", "Invalid Indonesian phone number format");
        let row = row_error(4, err).unwrap();
        assert_eq!(row.row, 4);
        assert_eq!(row.column.as_deref(), Some("phone"));
    }

    #[test]
    fn test_row_error_passes_through_other_errors() {
        let err = AppError::NotFound("Warehouse".to_string());
        assert!(matches!(row_error(2, err), Err(AppError::NotFound(_))));
    }
}
