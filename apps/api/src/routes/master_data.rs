//! Units and item types.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::Router;
use stockroom_core::requests::{ItemTypeRequest, UnitRequest};
use stockroom_core::{ItemType, Operation, Page, Unit};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{JsonBody, QueryParams};
use crate::response::ApiResponse;
use crate::routes::ListQuery;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/master-data/item-types",
            get(list_item_types).post(create_item_type),
        )
        .route(
            "/master-data/item-types/{id}",
            put(update_item_type).delete(delete_item_type),
        )
        .route("/master-data/units", get(list_units).post(create_unit))
        .route(
            "/master-data/units/{id}",
            put(update_unit).delete(delete_unit),
        )
}

// =============================================================================
// Item types
// =============================================================================

async fn list_item_types(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<ApiResponse<Page<ItemType>>> {
    auth.authorize(Operation::ReadMasterData)?;

    let page = state
        .db
        .item_types()
        .list(query.search(), query.page_request())
        .await?;
    Ok(ApiResponse::ok("Item types retrieved", page))
}

async fn create_item_type(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(req): JsonBody<ItemTypeRequest>,
) -> ApiResult<ApiResponse<ItemType>> {
    auth.authorize(Operation::WriteMasterData)?;
    let name = req.validate()?;

    let item_type = state.db.item_types().create(&name).await?;
    info!(id = %item_type.id, name = %item_type.name, "Item type created");
    Ok(ApiResponse::created("Item type created", item_type))
}

async fn update_item_type(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<ItemTypeRequest>,
) -> ApiResult<ApiResponse<ItemType>> {
    auth.authorize(Operation::WriteMasterData)?;
    let name = req.validate()?;

    let item_type = state.db.item_types().update(&id, &name).await?;
    Ok(ApiResponse::ok("Item type updated", item_type))
}

async fn delete_item_type(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Option<()>>> {
    auth.authorize(Operation::WriteMasterData)?;

    state.db.item_types().delete(&id).await?;
    info!(id = %id, "Item type deleted");
    Ok(ApiResponse::ok("Item type deleted", None))
}

// =============================================================================
// Units
// =============================================================================

async fn list_units(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<ApiResponse<Page<Unit>>> {
    auth.authorize(Operation::ReadMasterData)?;

    let page = state
        .db
        .units()
        .list(query.search(), query.page_request())
        .await?;
    Ok(ApiResponse::ok("Units retrieved", page))
}

async fn create_unit(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(req): JsonBody<UnitRequest>,
) -> ApiResult<ApiResponse<Unit>> {
    auth.authorize(Operation::WriteMasterData)?;
    let name = req.validate()?;

    let unit = state.db.units().create(&name).await?;
    info!(id = %unit.id, name = %unit.name, "Unit created");
    Ok(ApiResponse::created("Unit created", unit))
}

async fn update_unit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UnitRequest>,
) -> ApiResult<ApiResponse<Unit>> {
    auth.authorize(Operation::WriteMasterData)?;
    let name = req.validate()?;

    let unit = state.db.units().update(&id, &name).await?;
    Ok(ApiResponse::ok("Unit updated", unit))
}

async fn delete_unit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Option<()>>> {
    auth.authorize(Operation::WriteMasterData)?;

    state.db.units().delete(&id).await?;
    info!(id = %id, "Unit deleted");
    Ok(ApiResponse::ok("Unit deleted", None))
}
