//! # User Repository
//!
//! Database operations for staff accounts.
//!
//! Passwords arrive here already hashed; this layer never sees plaintext.
//! Users are never deleted.

use chrono::Utc;
use sqlx::SqlitePool;
use stockroom_core::{EntityKind, Page, PageRequest, Role, User};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;

/// A user to insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
}

/// Fields to change on a user. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user.
    ///
    /// ## Returns
    /// * `Ok(User)` - The stored user
    /// * `Err(Conflict)` - Username already taken
    pub async fn create(&self, new_user: NewUser) -> DbResult<User> {
        debug!(username = %new_user.username, role = %new_user.role, "Creating user");

        if self.username_taken(&new_user.username, None).await? {
            return Err(DbError::conflict(
                EntityKind::User,
                "username",
                new_user.username,
            ));
        }

        let now = Utc::now();
        let user = User {
            id: generate_id(),
            username: new_user.username,
            password_hash: new_user.password_hash,
            full_name: new_user.full_name,
            role: new_user.role,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, full_name, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by ID.
    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, full_name, role, created_at, updated_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by ID, failing with NotFound.
    pub async fn get(&self, id: &str) -> DbResult<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(EntityKind::User, id))
    }

    /// Gets a user by exact username (login).
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, full_name, role, created_at, updated_at
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Applies a partial update.
    ///
    /// ## Returns
    /// * `Err(NotFound)` - No such user
    /// * `Err(Conflict)` - New username belongs to another user
    pub async fn update(&self, id: &str, changes: UserUpdate) -> DbResult<User> {
        debug!(id = %id, "Updating user");

        let mut user = self.get(id).await?;

        if let Some(username) = changes.username {
            if self.username_taken(&username, Some(id)).await? {
                return Err(DbError::conflict(EntityKind::User, "username", username));
            }
            user.username = username;
        }
        if let Some(full_name) = changes.full_name {
            user.full_name = full_name;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE users SET
                username = ?2,
                full_name = ?3,
                password_hash = ?4,
                role = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    /// Lists users, newest first.
    pub async fn list(&self, page: PageRequest) -> DbResult<Page<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, full_name, role, created_at, updated_at
            FROM users
            ORDER BY created_at DESC, id DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = self.count().await?;
        Ok(Page::new(users, page, total))
    }

    /// Counts users.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// True when another user (other than `exclude_id`) holds `username`.
    async fn username_taken(&self, username: &str, exclude_id: Option<&str>) -> DbResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1 AND id != ?2)",
        )
        .bind(username)
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
    use crate::repository::test_support::database;
    use stockroom_core::CoreError;

    fn new_user(username: &str, role: Role) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "$argon2id$hash".to_string(),
            full_name: "Test User".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let db = database().await;
        let repo = db.users();

        let created = repo
            .create(new_user("alice", Role::WarehouseAdmin))
            .await
            .unwrap();

        let by_name = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
        assert_eq!(by_name.role, Role::WarehouseAdmin);
        assert_eq!(by_name.password_hash, "$argon2id$hash");

        assert!(repo.find_by_username("ALICE").await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let db = database().await;
        let repo = db.users();

        repo.create(new_user("alice", Role::Admin)).await.unwrap();
        let err = repo
            .create(new_user("alice", Role::WarehouseManager))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::Conflict {
                entity: EntityKind::User,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_own_username_and_rejects_taken_one() {
        let db = database().await;
        let repo = db.users();

        let alice = repo.create(new_user("alice", Role::Admin)).await.unwrap();
        repo.create(new_user("bobby", Role::Admin)).await.unwrap();

        // same username on itself is fine
        let updated = repo
            .update(
                &alice.id,
                UserUpdate {
                    username: Some("alice".to_string()),
                    role: Some(Role::WarehouseManager),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, Role::WarehouseManager);

        let err = repo
            .update(
                &alice.id,
                UserUpdate {
                    username: Some("bobby".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Conflict { .. })));

        let err = repo
            .update("missing", UserUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_paginates() {
        let db = database().await;
        let repo = db.users();

        for name in ["user1", "user2", "user3"] {
            repo.create(new_user(name, Role::WarehouseManager))
                .await
                .unwrap();
        }

        let page = repo.list(PageRequest::new(Some(2), Some(2))).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.pagination.total_data, 3);
        assert_eq!(page.pagination.total_pages, 2);
    }
}
