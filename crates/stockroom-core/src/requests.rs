//! # Request Payloads
//!
//! Raw create/update payloads as they arrive from clients, and the validated
//! inputs the repositories accept.
//!
//! ```text
//!   NewItemRequest ──validate()──► NewItem ──► ItemRepository::create
//!   NewTransactionRequest ──validate(actor)──► NewTransaction ──► engine
//! ```
//!
//! Every `validate` collects all field violations into one
//! `CoreError::ValidationFailed` instead of stopping at the first.
//! Fields default to empty so a missing field is reported like an empty one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, FieldErrors, ValidationError};
use crate::types::{parse_kind_filter, Role, TransactionKind};
use crate::validation::{
    parse_date, parse_optional_date, validate_item_name, validate_minimum_stock, validate_password,
    validate_quantity, validate_type_name, validate_unit_name, validate_username, validate_uuid,
};

// =============================================================================
// Auth & Users
// =============================================================================

/// Login credentials.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> CoreResult<()> {
        let mut errors = FieldErrors::default();
        errors.check(validate_username(&self.username));
        errors.check(validate_password(&self.password));
        errors.into_result()
    }
}

/// Admin request to create a user.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct NewUserRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub role: String,
}

impl NewUserRequest {
    /// Checks the fields, then the role.
    ///
    /// ## Returns
    /// The parsed role, `ValidationFailed`, or `InvalidRole`.
    pub fn validate(&self) -> CoreResult<Role> {
        let mut errors = FieldErrors::default();
        errors.check(validate_username(&self.username));
        errors.check(validate_password(&self.password));
        if self.role.trim().is_empty() {
            errors.push(ValidationError::Required {
                field: "role".to_string(),
            });
        }
        errors.into_result()?;

        self.role.parse()
    }
}

/// Partial update of a user. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct UserChanges {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl UserChanges {
    /// ## Returns
    /// The parsed role if one was given.
    pub fn validate(&self) -> CoreResult<Option<Role>> {
        let mut errors = FieldErrors::default();
        if let Some(username) = &self.username {
            errors.check(validate_username(username));
        }
        if let Some(password) = &self.password {
            errors.check(validate_password(password));
        }
        errors.into_result()?;

        self.role.as_deref().map(str::parse).transpose()
    }
}

// =============================================================================
// Master Data
// =============================================================================

/// Create or rename a unit.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct UnitRequest {
    pub unit_name: String,
}

impl UnitRequest {
    /// ## Returns
    /// The trimmed name.
    pub fn validate(&self) -> CoreResult<String> {
        validate_unit_name(&self.unit_name).map_err(CoreError::invalid_field)?;
        Ok(self.unit_name.trim().to_string())
    }
}

/// Create or rename an item type.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct ItemTypeRequest {
    pub type_name: String,
}

impl ItemTypeRequest {
    pub fn validate(&self) -> CoreResult<String> {
        validate_type_name(&self.type_name).map_err(CoreError::invalid_field)?;
        Ok(self.type_name.trim().to_string())
    }
}

/// Parses a form-encoded minimum stock value.
fn parse_minimum_stock(errors: &mut FieldErrors, raw: &str) -> Option<i64> {
    match raw.trim().parse::<i64>() {
        Ok(value) => {
            errors.check(validate_minimum_stock(value));
            Some(value)
        }
        Err(_) => {
            errors.push(ValidationError::InvalidFormat {
                field: "minimum_stock".to_string(),
                reason: "must be a whole number".to_string(),
            });
            None
        }
    }
}

/// Item creation form (the image travels separately).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewItemRequest {
    pub item_name: String,
    pub type_id: String,
    pub unit_id: String,
    /// Raw form value; missing or empty means 0.
    pub minimum_stock: Option<String>,
}

/// A validated item ready to be inserted with stock 0.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub type_id: String,
    pub unit_id: String,
    pub minimum_stock: i64,
    pub image: Option<String>,
}

impl NewItemRequest {
    pub fn validate(&self) -> CoreResult<NewItem> {
        let mut errors = FieldErrors::default();
        errors.check(validate_item_name(&self.item_name));
        errors.check(validate_uuid("type_id", &self.type_id));
        errors.check(validate_uuid("unit_id", &self.unit_id));
        let minimum_stock = match self.minimum_stock.as_deref().map(str::trim) {
            None | Some("") => Some(0),
            Some(raw) => parse_minimum_stock(&mut errors, raw),
        };
        errors.into_result()?;

        Ok(NewItem {
            name: self.item_name.trim().to_string(),
            type_id: self.type_id.clone(),
            unit_id: self.unit_id.clone(),
            minimum_stock: minimum_stock.unwrap_or_default(),
            image: None,
        })
    }
}

/// Item update form. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItemChangesRequest {
    pub item_name: Option<String>,
    pub type_id: Option<String>,
    pub unit_id: Option<String>,
    pub minimum_stock: Option<String>,
}

/// Validated partial item update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub type_id: Option<String>,
    pub unit_id: Option<String>,
    pub minimum_stock: Option<i64>,
    pub image: Option<String>,
}

impl ItemChangesRequest {
    pub fn validate(&self) -> CoreResult<ItemChanges> {
        let mut errors = FieldErrors::default();
        if let Some(name) = &self.item_name {
            errors.check(validate_item_name(name));
        }
        if let Some(type_id) = &self.type_id {
            errors.check(validate_uuid("type_id", type_id));
        }
        if let Some(unit_id) = &self.unit_id {
            errors.check(validate_uuid("unit_id", unit_id));
        }
        let minimum_stock = self
            .minimum_stock
            .as_deref()
            .and_then(|raw| parse_minimum_stock(&mut errors, raw));
        errors.into_result()?;

        Ok(ItemChanges {
            name: self.item_name.as_deref().map(|n| n.trim().to_string()),
            type_id: self.type_id.clone(),
            unit_id: self.unit_id.clone(),
            minimum_stock,
            image: None,
        })
    }
}

// =============================================================================
// Transactions
// =============================================================================

/// Client request to record a stock movement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct NewTransactionRequest {
    pub item_id: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub quantity: i64,
    /// `in` or `out`.
    pub transaction_type: String,
    pub description: Option<String>,
}

/// A validated movement attributed to an actor.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub item_id: String,
    pub date: NaiveDate,
    pub quantity: i64,
    pub kind: TransactionKind,
    pub description: Option<String>,
    pub user_id: String,
}

impl NewTransactionRequest {
    /// Validates every field and attaches the acting user.
    pub fn validate(&self, actor_id: &str) -> CoreResult<NewTransaction> {
        let mut errors = FieldErrors::default();
        errors.check(validate_uuid("item_id", &self.item_id));
        errors.check(validate_quantity(self.quantity));

        let date = parse_date("date", &self.date)
            .map_err(|err| errors.push(err))
            .ok();

        let kind = match self.transaction_type.as_str() {
            "in" => Some(TransactionKind::In),
            "out" => Some(TransactionKind::Out),
            _ => {
                errors.push(ValidationError::NotAllowed {
                    field: "transaction_type".to_string(),
                    allowed: TransactionKind::ALL
                        .iter()
                        .map(|k| k.as_str().to_string())
                        .collect(),
                });
                None
            }
        };
        let (Some(date), Some(kind)) = (date, kind) else {
            return Err(CoreError::ValidationFailed(errors));
        };
        errors.into_result()?;

        Ok(NewTransaction {
            item_id: self.item_id.clone(),
            date,
            quantity: self.quantity,
            kind,
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            user_id: actor_id.to_string(),
        })
    }
}

// =============================================================================
// List Filters
// =============================================================================

/// Filter of the item list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    /// Substring of the item name; empty matches everything.
    pub search: String,
    pub low_stock_only: bool,
}

impl ItemFilter {
    pub fn new(search: Option<&str>, low_stock_only: bool) -> Self {
        Self {
            search: search.unwrap_or_default().trim().to_string(),
            low_stock_only,
        }
    }
}

/// Filter of the transaction list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Substring of the item name; empty matches everything.
    pub search: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub kind: Option<TransactionKind>,
}

impl TransactionFilter {
    /// Parses raw query values. Reversed bounds are swapped, not rejected.
    ///
    /// ## Errors
    /// - `ValidationFailed` for malformed dates
    /// - `InvalidTransactionType` for a type outside {in, out}
    pub fn parse(
        search: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        kind: Option<&str>,
    ) -> CoreResult<Self> {
        let mut errors = FieldErrors::default();
        let start = parse_optional_date("start_date", start_date)
            .map_err(|err| errors.push(err))
            .ok()
            .flatten();
        let end = parse_optional_date("end_date", end_date)
            .map_err(|err| errors.push(err))
            .ok()
            .flatten();
        errors.into_result()?;

        let kind = parse_kind_filter(kind)?;

        let (start_date, end_date) = match (start, end) {
            (Some(s), Some(e)) if s > e => (Some(e), Some(s)),
            bounds => bounds,
        };

        Ok(Self {
            search: search.unwrap_or_default().trim().to_string(),
            start_date,
            end_date,
            kind,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn uuid() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    #[test]
    fn test_new_user_collects_all_field_errors() {
        let req = NewUserRequest {
            username: "bob".to_string(),
            password: "short".to_string(),
            full_name: String::new(),
            role: String::new(),
        };
        match req.validate() {
            Err(CoreError::ValidationFailed(errors)) => {
                assert_eq!(errors.len(), 3);
                assert!(errors.get("username").is_some());
                assert!(errors.get("password").is_some());
                assert!(errors.get("role").is_some());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_new_user_invalid_role() {
        let req = NewUserRequest {
            username: "alice".to_string(),
            password: "password1".to_string(),
            full_name: "Alice".to_string(),
            role: "superuser".to_string(),
        };
        assert!(matches!(req.validate(), Err(CoreError::InvalidRole(_))));

        let req = NewUserRequest {
            role: "warehouse_admin".to_string(),
            ..req
        };
        assert_eq!(req.validate().unwrap(), Role::WarehouseAdmin);
    }

    #[test]
    fn test_user_changes_only_checks_present_fields() {
        assert_eq!(UserChanges::default().validate().unwrap(), None);

        let changes = UserChanges {
            password: Some("123".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            changes.validate(),
            Err(CoreError::ValidationFailed(_))
        ));

        let changes = UserChanges {
            role: Some("warehouse_manager".to_string()),
            ..Default::default()
        };
        assert_eq!(changes.validate().unwrap(), Some(Role::WarehouseManager));
    }

    #[test]
    fn test_master_data_requests_trim() {
        let unit = UnitRequest {
            unit_name: "  kg ".to_string(),
        };
        assert_eq!(unit.validate().unwrap(), "kg");

        let item_type = ItemTypeRequest {
            type_name: "ab".to_string(),
        };
        assert!(item_type.validate().is_err());
    }

    #[test]
    fn test_new_item_request() {
        let req = NewItemRequest {
            item_name: "Laptop".to_string(),
            type_id: uuid(),
            unit_id: uuid(),
            minimum_stock: None,
        };
        let item = req.validate().unwrap();
        assert_eq!(item.minimum_stock, 0);
        assert!(item.image.is_none());

        let req = NewItemRequest {
            item_name: String::new(),
            type_id: "x".to_string(),
            unit_id: uuid(),
            minimum_stock: Some("-2".to_string()),
        };
        match req.validate() {
            Err(CoreError::ValidationFailed(errors)) => {
                assert_eq!(errors.len(), 3);
                assert!(errors.get("minimum_stock").is_some());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_item_changes_request_rejects_non_numeric_minimum() {
        let req = ItemChangesRequest {
            minimum_stock: Some("ten".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            req.validate(),
            Err(CoreError::ValidationFailed(e)) if e.get("minimum_stock").is_some()
        ));

        let req = ItemChangesRequest {
            minimum_stock: Some("7".to_string()),
            ..Default::default()
        };
        assert_eq!(req.validate().unwrap().minimum_stock, Some(7));
    }

    #[test]
    fn test_transaction_filter_swaps_reversed_dates() {
        let filter =
            TransactionFilter::parse(None, Some("2024-03-10"), Some("2024-03-01"), None).unwrap();
        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(filter.end_date, NaiveDate::from_ymd_opt(2024, 3, 10));
        assert_eq!(filter.search, "");
    }

    #[test]
    fn test_transaction_filter_errors() {
        assert!(matches!(
            TransactionFilter::parse(None, None, None, Some("inbound")),
            Err(CoreError::InvalidTransactionType(_))
        ));
        assert!(matches!(
            TransactionFilter::parse(None, Some("2024-13-01"), None, None),
            Err(CoreError::ValidationFailed(_))
        ));
        let filter = TransactionFilter::parse(Some(" lap "), None, None, Some("in")).unwrap();
        assert_eq!(filter.search, "lap");
        assert_eq!(filter.kind, Some(TransactionKind::In));
    }

    #[test]
    fn test_new_transaction_request() {
        let item_id = uuid();
        let req = NewTransactionRequest {
            item_id: item_id.clone(),
            date: "2024-05-01".to_string(),
            quantity: 3,
            transaction_type: "out".to_string(),
            description: Some("  ".to_string()),
        };
        let tx = req.validate("actor").unwrap();
        assert_eq!(tx.kind, TransactionKind::Out);
        assert_eq!(tx.user_id, "actor");
        assert_eq!(tx.description, None);

        let bad = NewTransactionRequest {
            item_id: "nope".to_string(),
            date: "May 1".to_string(),
            quantity: 0,
            transaction_type: "sideways".to_string(),
            description: None,
        };
        match bad.validate("actor") {
            Err(CoreError::ValidationFailed(errors)) => assert_eq!(errors.len(), 4),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
