//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Unit       │   │    ItemType     │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name (unique)  │   │  name (unique)  │   │  username       │       │
//! │  └────────┬────────┘   └────────┬────────┘   │  role           │       │
//! │           │                     │            └────────┬────────┘       │
//! │           └──────────┬──────────┘                     │                │
//! │                      ▼                                │                │
//! │           ┌─────────────────┐   ┌─────────────────┐   │                │
//! │           │      Item       │◄──│   Transaction   │◄──┘                │
//! │           │  ─────────────  │   │  ─────────────  │                    │
//! │           │  stock ≥ 0      │   │  quantity ≥ 1   │                    │
//! │           │  minimum_stock  │   │  in | out       │                    │
//! │           └─────────────────┘   └─────────────────┘                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity is keyed by a UUID v4 string generated at creation. Units,
//! item types and usernames are additionally unique by name.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Role
// =============================================================================

/// Access level of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Everything, including user management.
    Admin,
    /// Master data and transactions.
    WarehouseAdmin,
    /// Read-only access to stock, transactions, summaries and reports.
    WarehouseManager,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::WarehouseAdmin, Role::WarehouseManager];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::WarehouseAdmin => "warehouse_admin",
            Role::WarehouseManager => "warehouse_manager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| CoreError::InvalidRole(s.to_string()))
    }
}

// =============================================================================
// Transaction Kind
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Goods received; stock goes up.
    In,
    /// Goods issued; stock goes down.
    Out,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 2] = [TransactionKind::In, TransactionKind::Out];

    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::In => "in",
            TransactionKind::Out => "out",
        }
    }

    /// Signed stock change caused by a transaction of this kind.
    pub const fn delta(&self, quantity: i64) -> i64 {
        match self {
            TransactionKind::In => quantity,
            TransactionKind::Out => -quantity,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "in" => Ok(TransactionKind::In),
            "out" => Ok(TransactionKind::Out),
            other => Err(CoreError::InvalidTransactionType(other.to_string())),
        }
    }
}

/// Parses an optional type filter; an empty string means "no filter".
pub fn parse_kind_filter(raw: Option<&str>) -> CoreResult<Option<TransactionKind>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}

// =============================================================================
// User
// =============================================================================

/// A staff account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Login name, unique.
    pub username: String,

    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,

    /// Display name.
    pub full_name: String,

    pub role: Role,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit
// =============================================================================

/// A unit of measure ("pcs", "box", "kg").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Unit {
    #[serde(rename = "unit_id")]
    pub id: String,

    #[serde(rename = "unit_name")]
    pub name: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Item Type
// =============================================================================

/// A category of items ("Electronics", "Stationery").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ItemType {
    #[serde(rename = "type_id")]
    pub id: String,

    #[serde(rename = "type_name")]
    pub name: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Item
// =============================================================================

/// A trackable inventory good, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Item {
    #[serde(rename = "item_id")]
    pub id: String,

    #[serde(rename = "item_name")]
    pub name: String,

    pub type_id: String,

    pub unit_id: String,

    /// Current stock level, never negative.
    pub stock: i64,

    /// Threshold below which the item counts as low stock.
    pub minimum_stock: i64,

    /// Public URL of the item picture.
    pub image: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// True when stock has fallen below the configured minimum.
    pub fn is_low_stock(&self) -> bool {
        crate::stock::is_low_stock(self.stock, self.minimum_stock)
    }
}

/// An item joined with its type and unit names, as returned by list/get.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ItemDetail {
    #[serde(rename = "item_id")]
    pub id: String,

    #[serde(rename = "item_name")]
    pub name: String,

    pub type_id: String,

    pub type_name: String,

    pub unit_id: String,

    pub unit_name: String,

    pub stock: i64,

    pub minimum_stock: i64,

    pub image: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ItemDetail {
    pub fn is_low_stock(&self) -> bool {
        crate::stock::is_low_stock(self.stock, self.minimum_stock)
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A stock movement, as stored. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    #[serde(rename = "transaction_id")]
    pub id: String,

    pub item_id: String,

    /// Business date of the movement.
    #[ts(as = "String")]
    pub date: NaiveDate,

    /// Always ≥ 1.
    pub quantity: i64,

    pub transaction_type: TransactionKind,

    pub description: Option<String>,

    /// Actor who recorded the movement.
    pub user_id: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A transaction joined with its item and actor.
///
/// `current_stock` is the item's stock at read time (or right after the
/// write, for a freshly created transaction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionDetail {
    #[serde(rename = "transaction_id")]
    pub id: String,

    pub item_id: String,

    pub item_name: String,

    #[ts(as = "String")]
    pub date: NaiveDate,

    pub quantity: i64,

    pub transaction_type: TransactionKind,

    pub description: Option<String>,

    pub user_id: String,

    pub username: String,

    pub current_stock: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Result of deleting a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeletedTransaction {
    pub transaction_id: String,

    pub item_id: String,

    /// Item stock after the reversal.
    pub current_stock: i64,

    /// Set when the reversal had to clamp stock at zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(
            "warehouse_manager".parse::<Role>().unwrap(),
            Role::WarehouseManager
        );
        assert!(matches!(
            "Admin".parse::<Role>(),
            Err(CoreError::InvalidRole(r)) if r == "Admin"
        ));
    }

    #[test]
    fn test_role_serde_matches_as_str() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
    }

    #[test]
    fn test_transaction_kind_delta() {
        assert_eq!(TransactionKind::In.delta(4), 4);
        assert_eq!(TransactionKind::Out.delta(4), -4);
    }

    #[test]
    fn test_parse_kind_filter() {
        assert_eq!(parse_kind_filter(None).unwrap(), None);
        assert_eq!(parse_kind_filter(Some("")).unwrap(), None);
        assert_eq!(
            parse_kind_filter(Some("out")).unwrap(),
            Some(TransactionKind::Out)
        );
        assert!(matches!(
            parse_kind_filter(Some("sideways")),
            Err(CoreError::InvalidTransactionType(_))
        ));
    }

    #[test]
    fn test_user_password_hash_not_serialized() {
        let now = Utc::now();
        let user = User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            full_name: "Alice".to_string(),
            role: Role::Admin,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "admin");
    }

    #[test]
    fn test_deleted_transaction_omits_empty_warning() {
        let deleted = DeletedTransaction {
            transaction_id: "t1".to_string(),
            item_id: "i1".to_string(),
            current_stock: 3,
            warning: None,
        };
        let json = serde_json::to_value(&deleted).unwrap();
        assert!(json.get("warning").is_none());
    }
}
