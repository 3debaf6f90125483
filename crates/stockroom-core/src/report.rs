//! # Reports & Summary
//!
//! Row shapes, filters and grouping for the item report, the transaction
//! report and the inventory summary. Rendering to a file happens in the API.
//!
//! ## Transaction report layout
//! ```text
//!   type filter = none          type filter = out
//!   ┌────────────────────┐      ┌────────────────────┐
//!   │ section "in"       │      │ section "out"      │
//!   │   rows (date asc)  │      │   rows (date asc)  │
//!   ├────────────────────┤      └────────────────────┘
//!   │ section "out"      │
//!   │   rows (date asc)  │
//!   └────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::stock::is_low_stock;
use crate::types::{parse_kind_filter, TransactionKind};
use crate::validation::parse_optional_date;

// =============================================================================
// Item Report
// =============================================================================

/// Stock status of an item in the item report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum StockStatus {
    Low,
    Safe,
}

impl StockStatus {
    pub fn of(stock: i64, minimum_stock: i64) -> Self {
        if is_low_stock(stock, minimum_stock) {
            StockStatus::Low
        } else {
            StockStatus::Safe
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Low => "Low",
            StockStatus::Safe => "Safe",
        }
    }
}

/// One line of the item report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemReportRow {
    pub item_name: String,
    pub type_name: String,
    pub unit_name: String,
    pub stock: i64,
    pub minimum_stock: i64,
    pub status: StockStatus,
}

impl ItemReportRow {
    pub fn new(
        item_name: String,
        type_name: String,
        unit_name: String,
        stock: i64,
        minimum_stock: i64,
    ) -> Self {
        Self {
            status: StockStatus::of(stock, minimum_stock),
            item_name,
            type_name,
            unit_name,
            stock,
            minimum_stock,
        }
    }
}

/// Keeps only low rows when `low_stock_only` is set. Order is preserved.
pub fn filter_item_rows(rows: Vec<ItemReportRow>, low_stock_only: bool) -> Vec<ItemReportRow> {
    if !low_stock_only {
        return rows;
    }
    rows.into_iter()
        .filter(|row| row.status == StockStatus::Low)
        .collect()
}

// =============================================================================
// Transaction Report
// =============================================================================

/// One line of the transaction report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionReportRow {
    pub item_name: String,
    pub type_name: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub description: Option<String>,
    pub transaction_type: TransactionKind,
}

/// Validated filter of the transaction report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionReportFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub kind: Option<TransactionKind>,
}

impl TransactionReportFilter {
    /// Parses raw query values.
    ///
    /// ## Errors
    /// - `InvalidTransactionType` for a type outside {in, out}
    /// - `ValidationFailed` for a malformed date
    /// - `InvalidDateRange` when both dates are given and start > end
    pub fn parse(
        start_date: Option<&str>,
        end_date: Option<&str>,
        kind: Option<&str>,
    ) -> CoreResult<Self> {
        let kind = parse_kind_filter(kind)?;
        let start_date =
            parse_optional_date("start_date", start_date).map_err(CoreError::invalid_field)?;
        let end_date =
            parse_optional_date("end_date", end_date).map_err(CoreError::invalid_field)?;

        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(CoreError::InvalidDateRange { start, end });
            }
        }

        Ok(Self {
            start_date,
            end_date,
            kind,
        })
    }

    /// Kinds to render, in section order.
    pub fn kinds(&self) -> Vec<TransactionKind> {
        match self.kind {
            Some(kind) => vec![kind],
            None => TransactionKind::ALL.to_vec(),
        }
    }
}

/// Rows of one transaction type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub kind: TransactionKind,
    pub rows: Vec<TransactionReportRow>,
}

/// Splits date-ordered rows into one section per requested kind.
pub fn group_transaction_rows(
    rows: Vec<TransactionReportRow>,
    filter: &TransactionReportFilter,
) -> Vec<ReportSection> {
    let mut sections: Vec<ReportSection> = filter
        .kinds()
        .into_iter()
        .map(|kind| ReportSection {
            kind,
            rows: Vec::new(),
        })
        .collect();

    for row in rows {
        if let Some(section) = sections
            .iter_mut()
            .find(|s| s.kind == row.transaction_type)
        {
            section.rows.push(row);
        }
    }
    sections
}

// =============================================================================
// Inventory Summary
// =============================================================================

/// Raw aggregates read from storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventoryTotals {
    /// Number of items.
    pub item_count: i64,
    /// Sum of quantities of all "in" transactions.
    pub quantity_in: i64,
    /// Sum of quantities of all "out" transactions.
    pub quantity_out: i64,
}

/// Summary returned to clients. Only the requested figures are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventorySummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_items: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_out: Option<i64>,
}

impl InventorySummary {
    /// Shapes the totals for a `type` filter.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::report::{InventorySummary, InventoryTotals};
    /// use stockroom_core::TransactionKind;
    ///
    /// let totals = InventoryTotals { item_count: 1, quantity_in: 10, quantity_out: 8 };
    /// let summary = InventorySummary::from_totals(totals, Some(TransactionKind::In));
    /// assert_eq!(summary.items_in, Some(10));
    /// assert_eq!(summary.items_out, None);
    /// ```
    pub fn from_totals(totals: InventoryTotals, kind: Option<TransactionKind>) -> Self {
        match kind {
            None => Self {
                total_items: Some(totals.item_count),
                items_in: Some(totals.quantity_in),
                items_out: Some(totals.quantity_out),
            },
            Some(TransactionKind::In) => Self {
                items_in: Some(totals.quantity_in),
                ..Self::default()
            },
            Some(TransactionKind::Out) => Self {
                items_out: Some(totals.quantity_out),
                ..Self::default()
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn tx_row(kind: TransactionKind, d: &str) -> TransactionReportRow {
        TransactionReportRow {
            item_name: "Laptop".to_string(),
            type_name: "Electronics".to_string(),
            quantity: 1,
            date: date(d),
            description: None,
            transaction_type: kind,
        }
    }

    #[test]
    fn test_stock_status() {
        assert_eq!(StockStatus::of(2, 5), StockStatus::Low);
        assert_eq!(StockStatus::of(5, 5), StockStatus::Safe);
        assert_eq!(StockStatus::Low.as_str(), "Low");
    }

    #[test]
    fn test_filter_item_rows() {
        let rows = vec![
            ItemReportRow::new("a".into(), "t".into(), "u".into(), 1, 5),
            ItemReportRow::new("b".into(), "t".into(), "u".into(), 9, 5),
            ItemReportRow::new("c".into(), "t".into(), "u".into(), 0, 1),
        ];
        let low = filter_item_rows(rows.clone(), true);
        let names: Vec<_> = low.iter().map(|r| r.item_name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(filter_item_rows(rows, false).len(), 3);
    }

    #[test]
    fn test_report_filter_parse() {
        let filter = TransactionReportFilter::parse(Some("2024-01-01"), None, Some("in")).unwrap();
        assert_eq!(filter.start_date, Some(date("2024-01-01")));
        assert_eq!(filter.end_date, None);
        assert_eq!(filter.kinds(), vec![TransactionKind::In]);

        assert!(matches!(
            TransactionReportFilter::parse(None, None, Some("both")),
            Err(CoreError::InvalidTransactionType(_))
        ));
        assert!(matches!(
            TransactionReportFilter::parse(Some("2024-02-01"), Some("2024-01-01"), None),
            Err(CoreError::InvalidDateRange { .. })
        ));
        assert!(matches!(
            TransactionReportFilter::parse(Some("yesterday"), None, None),
            Err(CoreError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_group_transaction_rows() {
        let rows = vec![
            tx_row(TransactionKind::In, "2024-01-01"),
            tx_row(TransactionKind::Out, "2024-01-02"),
            tx_row(TransactionKind::In, "2024-01-03"),
        ];

        let all = group_transaction_rows(rows.clone(), &TransactionReportFilter::default());
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].kind, TransactionKind::In);
        assert_eq!(all[0].rows.len(), 2);
        assert_eq!(all[1].rows.len(), 1);

        let only_out = TransactionReportFilter {
            kind: Some(TransactionKind::Out),
            ..Default::default()
        };
        let sections = group_transaction_rows(rows, &only_out);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].kind, TransactionKind::Out);
    }

    #[test]
    fn test_summary_shapes() {
        let totals = InventoryTotals {
            item_count: 3,
            quantity_in: 10,
            quantity_out: 8,
        };
        let all = InventorySummary::from_totals(totals, None);
        assert_eq!(all.total_items, Some(3));
        assert_eq!(all.items_out, Some(8));

        let out = serde_json::to_value(InventorySummary::from_totals(
            totals,
            Some(TransactionKind::Out),
        ))
        .unwrap();
        assert_eq!(out, serde_json::json!({ "items_out": 8 }));
    }
}
