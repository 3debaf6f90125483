//! Stock transactions.

use axum::extract::{Path, State};
use axum::routing::{delete, get};
use axum::Router;
use serde::Deserialize;
use stockroom_core::requests::{NewTransactionRequest, TransactionFilter};
use stockroom_core::{DeletedTransaction, Operation, Page, PageRequest, TransactionDetail};
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{JsonBody, QueryParams};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/transactions/{id}", delete(delete_transaction))
}

/// `?page=&limit=&search=&start_date=&end_date=&type=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<TransactionListQuery>,
) -> ApiResult<ApiResponse<Page<TransactionDetail>>> {
    auth.authorize(Operation::ReadTransactions)?;

    let filter = TransactionFilter::parse(
        query.search.as_deref(),
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        query.kind.as_deref(),
    )?;
    let page = state
        .db
        .transactions()
        .list(&filter, PageRequest::new(query.page, query.limit))
        .await?;
    Ok(ApiResponse::ok("Transactions retrieved", page))
}

/// Records a movement on behalf of the caller.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(req): JsonBody<NewTransactionRequest>,
) -> ApiResult<ApiResponse<TransactionDetail>> {
    auth.authorize(Operation::WriteTransactions)?;
    let new_tx = req.validate(&auth.id)?;

    let transaction = state.db.transactions().create(new_tx).await?;
    Ok(ApiResponse::created("Transaction created", transaction))
}

/// Deletes a movement and reverses its effect on stock.
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<DeletedTransaction>> {
    auth.authorize(Operation::WriteTransactions)?;

    let deleted = state.db.transactions().delete(&id).await?;
    match &deleted.warning {
        Some(warning) => warn!(
            transaction_id = %id,
            deleted_by = %auth.id,
            %warning,
            "Transaction deleted with clamped stock"
        ),
        None => info!(transaction_id = %id, deleted_by = %auth.id, "Transaction deleted"),
    }
    Ok(ApiResponse::ok("Transaction deleted", deleted))
}
