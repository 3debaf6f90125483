//! Inventory summary.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use stockroom_core::report::InventorySummary;
use stockroom_core::{parse_kind_filter, Operation};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::QueryParams;
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/summary/inventory", get(inventory_summary))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// `GET /summary/inventory?type=`
///
/// Without `type` all three figures are returned; with `in` or `out` only
/// that direction's total.
async fn inventory_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<SummaryQuery>,
) -> ApiResult<ApiResponse<InventorySummary>> {
    auth.authorize(Operation::ReadSummary)?;
    let kind = parse_kind_filter(query.kind.as_deref())?;

    let summary = state.db.reports().inventory_summary(kind).await?;
    Ok(ApiResponse::ok("Inventory summary retrieved", summary))
}
