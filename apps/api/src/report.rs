//! Spreadsheet rendering of the item and transaction reports.
//!
//! ```text
//! ┌ sheet "ITEM REPORT" (or "LOW STOCK ITEMS") ─────────────────────────────┐
//! │ Item Name │ Item Type │ Unit │ Current Stock │ Minimum Stock │ Status   │
//! │ Laptop    │ Electr... │ pcs  │             2 │             5 │ Below... │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transaction report gets one sheet per transaction type. Header cells
//! are bold on a green fill and every column is 20 characters wide.

use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatPattern, Workbook, Worksheet, XlsxError};
use stockroom_core::report::{ItemReportRow, ReportSection, StockStatus};
use stockroom_core::validation::DATE_FORMAT;
use stockroom_core::TransactionKind;
use tracing::error;

use crate::error::{ApiError, ApiResult};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const ITEM_REPORT_SHEET: &str = "ITEM REPORT";
pub const LOW_STOCK_SHEET: &str = "LOW STOCK ITEMS";

const COLUMN_WIDTH: f64 = 20.0;
const HEADER_FILL: u32 = 0xDFF0D8;

const ITEM_HEADERS: [&str; 6] = [
    "Item Name",
    "Item Type",
    "Unit",
    "Current Stock",
    "Minimum Stock",
    "Stock Status",
];

const TRANSACTION_HEADERS: [&str; 5] = [
    "Item Name",
    "Item Type",
    "Quantity",
    "Transaction Date",
    "Description",
];

pub fn section_sheet(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::In => "INCOMING GOODS REPORT",
        TransactionKind::Out => "OUTGOING GOODS REPORT",
    }
}

fn status_label(status: StockStatus) -> &'static str {
    match status {
        StockStatus::Low => "Below minimum",
        StockStatus::Safe => "Safe",
    }
}

/// A rendered workbook served as a download.
#[derive(Debug, Clone)]
pub struct SpreadsheetReport {
    pub filename: String,
    pub body: Vec<u8>,
}

impl SpreadsheetReport {
    /// `<prefix>_<YYYYmmdd_HHMMSS>.xlsx`
    pub fn filename(prefix: &str, at: DateTime<Utc>) -> String {
        format!("{}_{}.xlsx", prefix, at.format("%Y%m%d_%H%M%S"))
    }
}

impl IntoResponse for SpreadsheetReport {
    fn into_response(self) -> Response {
        (
            [
                (CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
                (
                    CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", self.filename),
                ),
                (CACHE_CONTROL, "no-cache, no-store, must-revalidate".to_string()),
            ],
            self.body,
        )
            .into_response()
    }
}

fn render_failed(e: XlsxError) -> ApiError {
    error!(error = %e, "Failed to render report workbook");
    ApiError::Internal(format!("Failed to render report: {}", e))
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_pattern(FormatPattern::Solid)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center)
}

/// Adds a named sheet with the styled header row and column widths.
fn add_sheet<'a>(
    workbook: &'a mut Workbook,
    name: &str,
    headers: &[&str],
) -> Result<&'a mut Worksheet, XlsxError> {
    let header = header_format();
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;

    for (col, title) in (0u16..).zip(headers) {
        sheet.write_string_with_format(0, col, *title, &header)?;
        sheet.set_column_width(col, COLUMN_WIDTH)?;
    }
    Ok(sheet)
}

/// Builds the item report workbook.
pub fn item_workbook(rows: &[ItemReportRow], low_stock_only: bool) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let name = if low_stock_only {
        LOW_STOCK_SHEET
    } else {
        ITEM_REPORT_SHEET
    };
    let sheet = add_sheet(&mut workbook, name, &ITEM_HEADERS)?;

    for (row, item) in (1u32..).zip(rows) {
        sheet.write_string(row, 0, item.item_name.as_str())?;
        sheet.write_string(row, 1, item.type_name.as_str())?;
        sheet.write_string(row, 2, item.unit_name.as_str())?;
        sheet.write_number(row, 3, item.stock as f64)?;
        sheet.write_number(row, 4, item.minimum_stock as f64)?;
        sheet.write_string(row, 5, status_label(item.status))?;
    }

    Ok(workbook)
}

/// Builds the transaction report workbook, one sheet per section.
pub fn transaction_workbook(sections: &[ReportSection]) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();

    for section in sections {
        let sheet = add_sheet(
            &mut workbook,
            section_sheet(section.kind),
            &TRANSACTION_HEADERS,
        )?;

        for (row, tx) in (1u32..).zip(&section.rows) {
            sheet.write_string(row, 0, tx.item_name.as_str())?;
            sheet.write_string(row, 1, tx.type_name.as_str())?;
            sheet.write_number(row, 2, tx.quantity as f64)?;
            sheet.write_string(row, 3, tx.date.format(DATE_FORMAT).to_string())?;
            sheet.write_string(row, 4, tx.description.as_deref().unwrap_or_default())?;
        }
    }

    Ok(workbook)
}

/// Renders the item report to `.xlsx` bytes.
pub fn render_item_report(rows: &[ItemReportRow], low_stock_only: bool) -> ApiResult<Vec<u8>> {
    item_workbook(rows, low_stock_only)
        .and_then(|mut workbook| workbook.save_to_buffer())
        .map_err(render_failed)
}

/// Renders the transaction report to `.xlsx` bytes.
pub fn render_transaction_report(sections: &[ReportSection]) -> ApiResult<Vec<u8>> {
    transaction_workbook(sections)
        .and_then(|mut workbook| workbook.save_to_buffer())
        .map_err(render_failed)
}
