//! Items.
//!
//! Create and update take a multipart form with the text fields
//! `item_name`, `type_id`, `unit_id`, `minimum_stock` and an optional
//! `image` file. An image is only stored once the form and its type/unit
//! references have been checked.

use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use stockroom_core::requests::{ItemChangesRequest, ItemFilter, NewItemRequest};
use stockroom_core::validation::validate_image;
use stockroom_core::{
    CoreError, EntityKind, ItemDetail, Operation, Page, PageRequest, ValidationError,
    MAX_IMAGE_BYTES,
};
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::QueryParams;
use crate::images::ITEM_IMAGE_FOLDER;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Request body cap for item forms: room for one image plus text fields.
pub const ITEM_FORM_LIMIT: usize = 2 * MAX_IMAGE_BYTES as usize;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/low-stock", get(low_stock_items))
        .route(
            "/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .layer(DefaultBodyLimit::max(ITEM_FORM_LIMIT))
}

/// `?page=&limit=&search=&low_stock_only=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub low_stock_only: Option<bool>,
}

// =============================================================================
// Multipart form
// =============================================================================

struct ImageUpload {
    filename: String,
    bytes: Vec<u8>,
}

/// Raw item form. Text fields are `None` when the part was not sent.
#[derive(Default)]
struct ItemForm {
    item_name: Option<String>,
    type_id: Option<String>,
    unit_id: Option<String>,
    minimum_stock: Option<String>,
    image: Option<ImageUpload>,
}

impl ItemForm {
    async fn read(multipart: Result<Multipart, MultipartRejection>) -> ApiResult<Self> {
        let mut multipart = multipart.map_err(|rejection| {
            ApiError::from(CoreError::invalid_field(ValidationError::InvalidFormat {
                field: "body".to_string(),
                reason: rejection.body_text(),
            }))
        })?;

        let mut form = ItemForm::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match name.as_str() {
                "image" => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    // Browsers send an empty part when no file is chosen.
                    if !filename.is_empty() || !bytes.is_empty() {
                        form.image = Some(ImageUpload {
                            filename,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                "item_name" | "type_id" | "unit_id" | "minimum_stock" => {
                    let value = field.text().await.map_err(multipart_error)?;
                    let slot = match name.as_str() {
                        "item_name" => &mut form.item_name,
                        "type_id" => &mut form.type_id,
                        "unit_id" => &mut form.unit_id,
                        _ => &mut form.minimum_stock,
                    };
                    *slot = Some(value);
                }
                _ => {}
            }
        }
        Ok(form)
    }

    fn new_item_request(&self) -> NewItemRequest {
        NewItemRequest {
            item_name: self.item_name.clone().unwrap_or_default(),
            type_id: self.type_id.clone().unwrap_or_default(),
            unit_id: self.unit_id.clone().unwrap_or_default(),
            minimum_stock: self.minimum_stock.clone(),
        }
    }

    fn changes_request(&self) -> ItemChangesRequest {
        ItemChangesRequest {
            item_name: self.item_name.clone(),
            type_id: self.type_id.clone(),
            unit_id: self.unit_id.clone(),
            minimum_stock: self.minimum_stock.clone(),
        }
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return CoreError::ImageTooLarge {
            size: ITEM_FORM_LIMIT as u64,
            max: MAX_IMAGE_BYTES,
        }
        .into();
    }
    CoreError::invalid_field(ValidationError::InvalidFormat {
        field: "body".to_string(),
        reason: err.body_text(),
    })
    .into()
}

/// Checks the image, confirms the references, then stores the file.
async fn store_image(
    state: &AppState,
    image: Option<&ImageUpload>,
    type_id: Option<&str>,
    unit_id: Option<&str>,
) -> ApiResult<Option<String>> {
    let Some(image) = image else {
        return Ok(None);
    };

    validate_image(&image.filename, image.bytes.len() as u64)?;
    state.db.items().ensure_references(type_id, unit_id).await?;

    let url = state
        .images
        .upload(&image.bytes, &image.filename, ITEM_IMAGE_FOLDER)
        .await
        .inspect_err(|e| warn!(error = %e, filename = %image.filename, "Image upload failed"))?;
    Ok(Some(url))
}

/// Best-effort removal of a stored image that no row points at.
async fn discard_image(state: &AppState, url: Option<&str>) {
    let Some(url) = url else {
        return;
    };
    if let Err(e) = state.images.remove(url).await {
        warn!(error = %e, url = %url, "Failed to remove unused image");
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_items(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ItemListQuery>,
) -> ApiResult<ApiResponse<Page<ItemDetail>>> {
    auth.authorize(Operation::ReadMasterData)?;

    let filter = ItemFilter::new(
        query.search.as_deref(),
        query.low_stock_only.unwrap_or(false),
    );
    let page = state
        .db
        .items()
        .list(&filter, PageRequest::new(query.page, query.limit))
        .await?;
    Ok(ApiResponse::ok("Items retrieved", page))
}

async fn low_stock_items(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<ApiResponse<Vec<ItemDetail>>> {
    auth.authorize(Operation::ReadMasterData)?;

    let items = state.db.items().low_stock().await?;
    Ok(ApiResponse::ok("Low stock items retrieved", items))
}

async fn get_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<ItemDetail>> {
    auth.authorize(Operation::ReadMasterData)?;

    let item = state.db.items().get_detail(&id).await?;
    Ok(ApiResponse::ok("Item retrieved", item))
}

async fn create_item(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<ItemDetail>> {
    auth.authorize(Operation::WriteMasterData)?;

    let form = ItemForm::read(multipart).await?;
    let mut new_item = form.new_item_request().validate()?;
    new_item.image = store_image(
        &state,
        form.image.as_ref(),
        Some(&new_item.type_id),
        Some(&new_item.unit_id),
    )
    .await?;
    let stored = new_item.image.clone();

    let item = match state.db.items().create(new_item).await {
        Ok(item) => item,
        Err(e) => {
            discard_image(&state, stored.as_deref()).await;
            return Err(e.into());
        }
    };
    info!(item_id = %item.id, name = %item.name, created_by = %auth.id, "Item created");
    Ok(ApiResponse::created("Item created", item))
}

async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<ItemDetail>> {
    auth.authorize(Operation::WriteMasterData)?;

    let form = ItemForm::read(multipart).await?;
    let mut changes = form.changes_request().validate()?;

    let mut replaced = None;
    if form.image.is_some() {
        let Some(existing) = state.db.items().find_by_id(&id).await? else {
            return Err(CoreError::not_found(EntityKind::Item, id).into());
        };
        replaced = existing.image;
    }
    changes.image = store_image(
        &state,
        form.image.as_ref(),
        changes.type_id.as_deref(),
        changes.unit_id.as_deref(),
    )
    .await?;
    let stored = changes.image.clone();

    let item = match state.db.items().update(&id, changes).await {
        Ok(item) => item,
        Err(e) => {
            discard_image(&state, stored.as_deref()).await;
            return Err(e.into());
        }
    };
    if stored.is_some() {
        discard_image(&state, replaced.as_deref()).await;
    }
    info!(item_id = %item.id, updated_by = %auth.id, "Item updated");
    Ok(ApiResponse::ok("Item updated", item))
}

async fn delete_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Option<()>>> {
    auth.authorize(Operation::WriteMasterData)?;

    state.db.items().delete(&id).await?;
    info!(item_id = %id, deleted_by = %auth.id, "Item deleted");
    Ok(ApiResponse::ok("Item deleted", None))
}
