//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                           │
//! │       │                                                                 │
//! │       │  db.transactions().create(new_tx)                               │
//! │       ▼                                                                 │
//! │  TransactionRepository                                                  │
//! │  ├── create(&self, NewTransaction)   ← one SQLite transaction           │
//! │  ├── delete(&self, id)               ← one SQLite transaction           │
//! │  └── list(&self, filter, page)                                          │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Accounts, login lookup
//! - [`UnitRepository`](unit::UnitRepository) - Units of measure
//! - [`ItemTypeRepository`](item_type::ItemTypeRepository) - Item categories
//! - [`ItemRepository`](item::ItemRepository) - Items, low-stock lookup
//! - [`TransactionRepository`](transaction::TransactionRepository) - The stock engine
//! - [`ReportRepository`](report::ReportRepository) - Reports and summary
//!
//! ## Conventions
//! - Lists are ordered newest first with `id` as tie-breaker
//! - Name searches are substring matches; an empty search matches everything
//! - Deleting a referenced row fails with `InUse` instead of cascading

use uuid::Uuid;

pub mod item;
pub mod item_type;
pub mod report;
pub mod transaction;
pub mod unit;
pub mod user;

/// Generates a new entity ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by the repository tests.

    use stockroom_core::Role;

    use crate::repository::user::NewUser;
    use crate::{Database, DbConfig};

    pub async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Creates a unit, an item type and an admin; returns their ids.
    pub async fn fixtures(db: &Database) -> (String, String, String) {
        let unit = db.units().create("pcs").await.unwrap();
        let item_type = db.item_types().create("Electronics").await.unwrap();
        let user = db
            .users()
            .create(NewUser {
                username: "admin".to_string(),
                password_hash: "hash".to_string(),
                full_name: "Administrator".to_string(),
                role: Role::Admin,
            })
            .await
            .unwrap();
        (unit.id, item_type.id, user.id)
    }
}
