//! # Report Repository
//!
//! Read-only aggregate queries: the item report, the transaction report
//! and the inventory summary. Rendering (xlsx) lives in the API crate.

use sqlx::SqlitePool;
use stockroom_core::report::{
    filter_item_rows, group_transaction_rows, InventorySummary, InventoryTotals, ItemReportRow,
    ReportSection, TransactionReportFilter, TransactionReportRow,
};
use stockroom_core::TransactionKind;
use tracing::debug;

use crate::error::DbResult;

/// Repository for reports and the summary.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Rows of the item report in insertion order.
    ///
    /// With `low_stock_only`, only items below their minimum are kept.
    pub async fn item_report(&self, low_stock_only: bool) -> DbResult<Vec<ItemReportRow>> {
        debug!(low_stock_only, "Building item report");

        let rows: Vec<(String, String, String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT i.name, t.name, u.name, i.stock, i.minimum_stock
            FROM items i
            JOIN item_types t ON t.id = i.type_id
            JOIN units u ON u.id = i.unit_id
            ORDER BY i.created_at ASC, i.rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let rows = rows
            .into_iter()
            .map(|(item_name, type_name, unit_name, stock, minimum_stock)| {
                ItemReportRow::new(item_name, type_name, unit_name, stock, minimum_stock)
            })
            .collect();

        Ok(filter_item_rows(rows, low_stock_only))
    }

    /// Transaction report, one section per requested type, rows by date.
    pub async fn transaction_report(
        &self,
        filter: &TransactionReportFilter,
    ) -> DbResult<Vec<ReportSection>> {
        debug!(?filter, "Building transaction report");

        let rows = sqlx::query_as::<_, TransactionReportRow>(
            r#"
            SELECT
                i.name AS item_name,
                ty.name AS type_name,
                t.quantity,
                t.date,
                t.description,
                t.transaction_type
            FROM transactions t
            JOIN items i ON i.id = t.item_id
            JOIN item_types ty ON ty.id = i.type_id
            WHERE (?1 IS NULL OR t.date >= ?1)
              AND (?2 IS NULL OR t.date <= ?2)
              AND (?3 IS NULL OR t.transaction_type = ?3)
            ORDER BY t.date ASC, t.created_at ASC, t.rowid ASC
            "#,
        )
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(filter.kind)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_transaction_rows(rows, filter))
    }

    /// Item count and total quantities moved in each direction.
    pub async fn inventory_totals(&self) -> DbResult<InventoryTotals> {
        let (item_count, quantity_in, quantity_out): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM items),
                COALESCE(SUM(CASE WHEN transaction_type = 'in' THEN quantity END), 0),
                COALESCE(SUM(CASE WHEN transaction_type = 'out' THEN quantity END), 0)
            FROM transactions
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(InventoryTotals {
            item_count,
            quantity_in,
            quantity_out,
        })
    }

    /// Summary shaped for an optional type filter.
    pub async fn inventory_summary(
        &self,
        kind: Option<TransactionKind>,
    ) -> DbResult<InventorySummary> {
        let totals = self.inventory_totals().await?;
        Ok(InventorySummary::from_totals(totals, kind))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
