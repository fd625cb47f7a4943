//! Document number allocation
//!
//! Numbers are allocated inside the caller's transaction while holding a
//! transaction-scoped advisory lock on the prefix, so two concurrent
//! documents for the same month never receive the same number.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use shared::models::DocumentKind;
use shared::numbering::{document_prefix, next_document_number};
use sqlx::PgConnection;

use crate::error::AppResult;

async fn lock_prefix(conn: &mut PgConnection, prefix: &str) -> AppResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(prefix)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Distinct prefixes for documents of `kind` on `dates`, in lock order
pub fn sorted_prefixes(kind: DocumentKind, dates: impl IntoIterator<Item = NaiveDate>) -> Vec<String> {
    dates
        .into_iter()
        .map(|date| document_prefix(kind, date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Take the advisory lock of every month a batch will number into
///
/// Must run before any stock row is locked. The locks are re-entrant, so
/// `allocate` taking one again later does not block.
pub async fn lock_months(
    conn: &mut PgConnection,
    kind: DocumentKind,
    dates: impl IntoIterator<Item = NaiveDate>,
) -> AppResult<()> {
    for prefix in sorted_prefixes(kind, dates) {
        lock_prefix(conn, &prefix).await?;
    }
    Ok(())
}

/// Allocate the next document number for `kind` dated `date`
pub async fn allocate(
    conn: &mut PgConnection,
    kind: DocumentKind,
    date: NaiveDate,
) -> AppResult<String> {
    let prefix = document_prefix(kind, date);
    lock_prefix(conn, &prefix).await?;

    let existing = sqlx::query_scalar::<_, String>(&format!(
        "SELECT document_number FROM {} WHERE document_number LIKE $1",
        kind.table_name()
    ))
    .bind(format!("{}-%", prefix))
    .fetch_all(&mut *conn)
    .await?;

    let number = next_document_number(kind, date, existing.iter().map(String::as_str));
    tracing::debug!(%number, "Allocated document number");
    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_sorted_prefixes_dedupes_months() {
        let dates = [date(2025, 7, 3), date(2025, 6, 30), date(2025, 7, 28), date(2025, 6, 1)];
        assert_eq!(
            sorted_prefixes(DocumentKind::Inbound, dates),
            vec!["SM-0625".to_string(), "SM-0725".to_string()]
        );
    }

    #[test]
    fn test_sorted_prefixes_order_is_independent_of_input() {
        let forward = sorted_prefixes(DocumentKind::Inbound, [date(2025, 6, 1), date(2025, 7, 1)]);
        let backward = sorted_prefixes(DocumentKind::Inbound, [date(2025, 7, 1), date(2025, 6, 1)]);
        assert_eq!(forward, backward);
        assert!(sorted_prefixes(DocumentKind::Inbound, Vec::new()).is_empty());
    }
}
