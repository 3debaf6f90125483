//! # Item Repository
//!
//! Database operations for items.
//!
//! ## Key Operations
//! - CRUD with type/unit joins (`ItemDetail`)
//! - Substring search and low-stock filtering
//! - Referential checks: type and unit must exist, items with
//!   transactions cannot be deleted
//!
//! Stock is never written here; only the transaction engine moves it.

use chrono::Utc;
use sqlx::SqlitePool;
use stockroom_core::requests::{ItemChanges, ItemFilter, NewItem};
use stockroom_core::{EntityKind, Item, ItemDetail, Page, PageRequest};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;

/// Columns of [`ItemDetail`], joined with type and unit names.
const ITEM_DETAIL_SELECT: &str = r#"
    SELECT
        i.id,
        i.name,
        i.type_id,
        t.name AS type_name,
        i.unit_id,
        u.name AS unit_name,
        i.stock,
        i.minimum_stock,
        i.image,
        i.created_at,
        i.updated_at
    FROM items i
    JOIN item_types t ON t.id = i.type_id
    JOIN units u ON u.id = i.unit_id
"#;

/// Repository for item database operations.
///
/// ## Usage
/// ```rust,ignore
/// let page = db.items().list(&ItemFilter::new(Some("lap"), false), PageRequest::default()).await?;
/// let low = db.items().low_stock().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Inserts an item with stock 0.
    ///
    /// ## Returns
    /// * `Ok(ItemDetail)` - Stored item with type and unit names
    /// * `Err(NotFound)` - Type or unit doesn't exist
    pub async fn create(&self, new_item: NewItem) -> DbResult<ItemDetail> {
        debug!(name = %new_item.name, "Creating item");

        self.ensure_references(Some(&new_item.type_id), Some(&new_item.unit_id))
            .await?;

        let id = generate_id();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO items (
                id, name, type_id, unit_id, stock, minimum_stock, image,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&id)
        .bind(&new_item.name)
        .bind(&new_item.type_id)
        .bind(&new_item.unit_id)
        .bind(new_item.minimum_stock)
        .bind(&new_item.image)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_detail(&id).await
    }

    /// Checks that the referenced item type and unit exist.
    ///
    /// Called before an image is uploaded so a bad reference never leaves
    /// an orphaned file behind.
    pub async fn ensure_references(
        &self,
        type_id: Option<&str>,
        unit_id: Option<&str>,
    ) -> DbResult<()> {
        if let Some(type_id) = type_id {
            let found: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM item_types WHERE id = ?1)")
                    .bind(type_id)
                    .fetch_one(&self.pool)
                    .await?;
            if !found {
                return Err(DbError::not_found(EntityKind::ItemType, type_id));
            }
        }

        if let Some(unit_id) = unit_id {
            let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM units WHERE id = ?1)")
                .bind(unit_id)
                .fetch_one(&self.pool)
                .await?;
            if !found {
                return Err(DbError::not_found(EntityKind::Unit, unit_id));
            }
        }

        Ok(())
    }

    /// Gets the stored item by ID.
    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, name, type_id, unit_id, stock, minimum_stock, image, created_at, updated_at
            FROM items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Gets an item with its type and unit names, failing with NotFound.
    pub async fn get_detail(&self, id: &str) -> DbResult<ItemDetail> {
        let sql = format!("{ITEM_DETAIL_SELECT} WHERE i.id = ?1");

        sqlx::query_as::<_, ItemDetail>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(EntityKind::Item, id))
    }

    /// Applies a partial update. Stock is not touched.
    ///
    /// ## Returns
    /// * `Err(NotFound)` - Item, or a newly referenced type/unit, doesn't exist
    pub async fn update(&self, id: &str, changes: ItemChanges) -> DbResult<ItemDetail> {
        debug!(id = %id, "Updating item");

        let mut item = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(EntityKind::Item, id))?;

        self.ensure_references(changes.type_id.as_deref(), changes.unit_id.as_deref())
            .await?;

        if let Some(name) = changes.name {
            item.name = name;
        }
        if let Some(type_id) = changes.type_id {
            item.type_id = type_id;
        }
        if let Some(unit_id) = changes.unit_id {
            item.unit_id = unit_id;
        }
        if let Some(minimum_stock) = changes.minimum_stock {
            item.minimum_stock = minimum_stock;
        }
        if let Some(image) = changes.image {
            item.image = Some(image);
        }

        sqlx::query(
            r#"
            UPDATE items SET
                name = ?2,
                type_id = ?3,
                unit_id = ?4,
                minimum_stock = ?5,
                image = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.type_id)
        .bind(&item.unit_id)
        .bind(item.minimum_stock)
        .bind(&item.image)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_detail(id).await
    }

    /// Deletes an item without transactions.
    ///
    /// ## Returns
    /// * `Err(NotFound)` - No such item
    /// * `Err(InUse)` - Transactions still reference it
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting item");

        if self.find_by_id(id).await?.is_none() {
            return Err(DbError::not_found(EntityKind::Item, id));
        }

        let used_by: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE item_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if used_by > 0 {
            return Err(DbError::in_use(
                EntityKind::Item,
                EntityKind::Transaction,
                used_by,
            ));
        }

        sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Lists items matching `filter`, newest first.
    pub async fn list(&self, filter: &ItemFilter, page: PageRequest) -> DbResult<Page<ItemDetail>> {
        debug!(search = %filter.search, low_stock_only = filter.low_stock_only, "Listing items");

        let sql = format!(
            r#"{ITEM_DETAIL_SELECT}
            WHERE (?1 = '' OR i.name LIKE '%' || ?1 || '%')
              AND (?2 = 0 OR i.stock < i.minimum_stock)
            ORDER BY i.created_at DESC, i.id DESC
            LIMIT ?3 OFFSET ?4
            "#
        );

        let items = sqlx::query_as::<_, ItemDetail>(&sql)
            .bind(&filter.search)
            .bind(filter.low_stock_only)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM items i
            WHERE (?1 = '' OR i.name LIKE '%' || ?1 || '%')
              AND (?2 = 0 OR i.stock < i.minimum_stock)
            "#,
        )
        .bind(&filter.search)
        .bind(filter.low_stock_only)
        .fetch_one(&self.pool)
        .await?;

        Ok(Page::new(items, page, total))
    }

    /// All items with `stock < minimum_stock`, newest first.
    pub async fn low_stock(&self) -> DbResult<Vec<ItemDetail>> {
        let sql = format!(
            "{ITEM_DETAIL_SELECT} WHERE i.stock < i.minimum_stock ORDER BY i.created_at DESC, i.id DESC"
        );

        let items = sqlx::query_as::<_, ItemDetail>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Counts items.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
