//! # Unit Repository
//!
//! Database operations for units of measure.

use chrono::Utc;
use sqlx::SqlitePool;
use stockroom_core::{EntityKind, Page, PageRequest, Unit};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;

/// Repository for unit database operations.
#[derive(Debug, Clone)]
pub struct UnitRepository {
    pool: SqlitePool,
}

impl UnitRepository {
    /// Creates a new UnitRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UnitRepository { pool }
    }

    /// Inserts a unit.
    ///
    /// ## Returns
    /// * `Err(Conflict)` - Name already taken
    pub async fn create(&self, name: &str) -> DbResult<Unit> {
        debug!(name = %name, "Creating unit");

        if self.name_taken(name, None).await? {
            return Err(DbError::conflict(EntityKind::Unit, "unit_name", name));
        }

        let now = Utc::now();
        let unit = Unit {
            id: generate_id(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query("INSERT INTO units (id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&unit.id)
            .bind(&unit.name)
            .bind(unit.created_at)
            .bind(unit.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(unit)
    }

    /// Gets a unit by ID.
    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<Unit>> {
        let unit = sqlx::query_as::<_, Unit>(
            "SELECT id, name, created_at, updated_at FROM units WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(unit)
    }

    /// Gets a unit by ID, failing with NotFound.
    pub async fn get(&self, id: &str) -> DbResult<Unit> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(EntityKind::Unit, id))
    }

    /// Renames a unit.
    ///
    /// Keeping the current name is not a conflict.
    pub async fn update(&self, id: &str, name: &str) -> DbResult<Unit> {
        debug!(id = %id, name = %name, "Updating unit");

        let mut unit = self.get(id).await?;

        if self.name_taken(name, Some(id)).await? {
            return Err(DbError::conflict(EntityKind::Unit, "unit_name", name));
        }

        unit.name = name.to_string();
        unit.updated_at = Utc::now();

        sqlx::query("UPDATE units SET name = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&unit.id)
            .bind(&unit.name)
            .bind(unit.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(unit)
    }

    /// Deletes a unit no item uses.
    ///
    /// ## Returns
    /// * `Err(NotFound)` - No such unit
    /// * `Err(InUse)` - Items still reference it
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting unit");

        self.get(id).await?;

        let used_by: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE unit_id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if used_by > 0 {
            return Err(DbError::in_use(EntityKind::Unit, EntityKind::Item, used_by));
        }

        sqlx::query("DELETE FROM units WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Lists units whose name contains `search`, newest first.
    pub async fn list(&self, search: &str, page: PageRequest) -> DbResult<Page<Unit>> {
        let units = sqlx::query_as::<_, Unit>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM units
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
            "SELECT COUNT(*) FROM units WHERE (?1 = '' OR name LIKE '%' || ?1 || '%')",
        )
        .bind(search)
        .fetch_one(&self.pool)
        .await?;

        Ok(Page::new(units, page, total))
    }

    /// Counts units.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM units")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn name_taken(&self, name: &str, exclude_id: Option<&str>) -> DbResult<bool> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM units WHERE name = ?1 AND id != ?2)")
                .bind(name)
                .bind(exclude_id.unwrap_or_default())
                .fetch_one(&self.pool)
                .await?;

        Ok(taken)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{database, fixtures};
    use stockroom_core::requests::NewItem;
    use stockroom_core::CoreError;

    #[tokio::test]
    async fn test_unique_names() {
        let db = database().await;
        let repo = db.units();

        let kg = repo.create("kg").await.unwrap();
        let err = repo.create("kg").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Conflict {
                entity: EntityKind::Unit,
                ..
            })
        ));

        // case-sensitive exact match
        repo.create("KG").await.unwrap();

        // self-update with unchanged name does not conflict
        let same = repo.update(&kg.id, "kg").await.unwrap();
        assert_eq!(same.name, "kg");

        let err = repo.update(&kg.id, "KG").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_delete_in_use_is_rejected() {
        let db = database().await;
        let (unit_id, type_id, _) = fixtures(&db).await;

        db.items()
            .create(NewItem {
                name: "Laptop".to_string(),
                type_id,
                unit_id: unit_id.clone(),
                minimum_stock: 0,
                image: None,
            })
            .await
            .unwrap();

        let err = db.units().delete(&unit_id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InUse { count: 1, .. })
        ));
        assert!(db.units().find_by_id(&unit_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_and_not_found() {
        let db = database().await;
        let repo = db.units();

        let box_unit = repo.create("box").await.unwrap();
        repo.delete(&box_unit.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);

        let err = repo.delete(&box_unit.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_search() {
        let db = database().await;
        let repo = db.units();

        for name in ["box", "boxes", "kg"] {
            repo.create(name).await.unwrap();
        }

        let page = repo.list("box", PageRequest::default()).await.unwrap();
        assert_eq!(page.pagination.total_data, 2);
        assert!(page.data.iter().all(|u| u.name.contains("box")));

        let all = repo.list("", PageRequest::default()).await.unwrap();
        assert_eq!(all.data.len(), 3);
    }
}
