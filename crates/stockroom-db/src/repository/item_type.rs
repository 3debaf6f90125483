//! # Item Type Repository
//!
//! Database operations for item categories. Mirrors the unit repository;
//! names must be unique and a type in use by items cannot be deleted.

use chrono::Utc;
use sqlx::SqlitePool;
use stockroom_core::{EntityKind, ItemType, Page, PageRequest};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;

/// Repository for item type database operations.
#[derive(Debug, Clone)]
pub struct ItemTypeRepository {
    pool: SqlitePool,
}

impl ItemTypeRepository {
    /// Creates a new ItemTypeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemTypeRepository { pool }
    }

    /// Inserts an item type. Fails with Conflict if the name is taken.
    pub async fn create(&self, name: &str) -> DbResult<ItemType> {
        debug!(name = %name, "Creating item type");

        if self.name_taken(name, None).await? {
            return Err(DbError::conflict(EntityKind::ItemType, "type_name", name));
        }

        let now = Utc::now();
        let item_type = ItemType {
            id: generate_id(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO item_types (id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&item_type.id)
        .bind(&item_type.name)
        .bind(item_type.created_at)
        .bind(item_type.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(item_type)
    }

    /// Gets an item type by ID.
    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<ItemType>> {
        let item_type = sqlx::query_as::<_, ItemType>(
            "SELECT id, name, created_at, updated_at FROM item_types WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item_type)
    }

    /// Gets an item type by ID, failing with NotFound.
    pub async fn get(&self, id: &str) -> DbResult<ItemType> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(EntityKind::ItemType, id))
    }

    /// Renames an item type.
    pub async fn update(&self, id: &str, name: &str) -> DbResult<ItemType> {
        debug!(id = %id, name = %name, "Updating item type");

        let mut item_type = self.get(id).await?;

        if self.name_taken(name, Some(id)).await? {
            return Err(DbError::conflict(EntityKind::ItemType, "type_name", name));
        }

        item_type.name = name.to_string();
        item_type.updated_at = Utc::now();

        sqlx::query("UPDATE item_types SET name = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&item_type.id)
            .bind(&item_type.name)
            .bind(item_type.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(item_type)
    }

    /// Deletes an item type no item uses.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting item type");

        self.get(id).await?;

        let used_by: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE type_id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if used_by > 0 {
            return Err(DbError::in_use(
                EntityKind::ItemType,
                EntityKind::Item,
                used_by,
            ));
        }

        sqlx::query("DELETE FROM item_types WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Lists item types whose name contains `search`, newest first.
    pub async fn list(&self, search: &str, page: PageRequest) -> DbResult<Page<ItemType>> {
        let item_types = sqlx::query_as::<_, ItemType>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM item_types
            WHERE (?1 = '' OR name LIKE '%' || ?1 || '%')
            ORDER BY created_at DESC, id DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(search)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM item_types WHERE (?1 = '' OR name LIKE '%' || ?1 || '%')",
        )
        .bind(search)
        .fetch_one(&self.pool)
        .await?;

        Ok(Page::new(item_types, page, total))
    }

    /// Counts item types.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM item_types")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn name_taken(&self, name: &str, exclude_id: Option<&str>) -> DbResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM item_types WHERE name = ?1 AND id != ?2)",
        )
        .bind(name)
        .bind(exclude_id.unwrap_or_default())
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{database, fixtures};
    use stockroom_core::requests::NewItem;
    use stockroom_core::CoreError;

    #[tokio::test]
    async fn test_create_update_conflict() {
        let db = database().await;
        let repo = db.item_types();

        let food = repo.create("Food").await.unwrap();
        let tools = repo.create("Tools").await.unwrap();

        assert!(matches!(
            repo.create("Food").await.unwrap_err(),
            DbError::Domain(CoreError::Conflict {
                entity: EntityKind::ItemType,
                ..
            })
        ));
        assert!(matches!(
            repo.update(&tools.id, "Food").await.unwrap_err(),
            DbError::Domain(CoreError::Conflict { .. })
        ));

        let renamed = repo.update(&food.id, "Groceries").await.unwrap();
        assert_eq!(renamed.name, "Groceries");
        assert_eq!(repo.get(&food.id).await.unwrap().name, "Groceries");
    }

    #[tokio::test]
    async fn test_delete_in_use_is_rejected() {
        let db = database().await;
        let (unit_id, type_id, _) = fixtures(&db).await;

        for name in ["Laptop", "Phone"] {
            db.items()
                .create(NewItem {
                    name: name.to_string(),
                    type_id: type_id.clone(),
                    unit_id: unit_id.clone(),
                    minimum_stock: 1,
                    image: None,
                })
                .await
                .unwrap();
        }

        assert!(matches!(
            db.item_types().delete(&type_id).await.unwrap_err(),
            DbError::Domain(CoreError::InUse {
                entity: EntityKind::ItemType,
                count: 2,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_missing_type() {
        let db = database().await;
        assert!(matches!(
            db.item_types().update("nope", "Whatever").await.unwrap_err(),
            DbError::Domain(CoreError::NotFound {
                entity: EntityKind::ItemType,
                ..
            })
        ));
    }
}
