//! Spreadsheet (.xlsx) report downloads.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use stockroom_core::report::TransactionReportFilter;
use stockroom_core::Operation;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::QueryParams;
use crate::report::{render_item_report, render_transaction_report, SpreadsheetReport};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/items", get(item_report))
        .route("/reports/transactions", get(transaction_report))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemReportQuery {
    pub low_stock_only: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

async fn item_report(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ItemReportQuery>,
) -> ApiResult<SpreadsheetReport> {
    auth.authorize(Operation::GenerateReports)?;
    let low_stock_only = query.low_stock_only.unwrap_or(false);

    let rows = state.db.reports().item_report(low_stock_only).await?;
    let body = render_item_report(&rows, low_stock_only)?;

    info!(rows = rows.len(), low_stock_only, requested_by = %auth.id, "Item report generated");
    Ok(SpreadsheetReport {
        filename: SpreadsheetReport::filename("item_report", Utc::now()),
        body,
    })
}

async fn transaction_report(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<TransactionReportQuery>,
) -> ApiResult<SpreadsheetReport> {
    auth.authorize(Operation::GenerateReports)?;
    let filter = TransactionReportFilter::parse(
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        query.kind.as_deref(),
    )?;

    let sections = state.db.reports().transaction_report(&filter).await?;
    let body = render_transaction_report(&sections)?;

    info!(
        sections = sections.len(),
        rows = sections.iter().map(|s| s.rows.len()).sum::<usize>(),
        requested_by = %auth.id,
        "Transaction report generated"
    );
    Ok(SpreadsheetReport {
        filename: SpreadsheetReport::filename("transaction_report", Utc::now()),
        body,
    })
}
