//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                        │
//! │  ├── ValidationError  - One failed field rule                           │
//! │  └── FieldErrors      - Every failed field of one request               │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                   │
//! │  └── DbError          - Database failures, wraps CoreError              │
//! │                                                                         │
//! │  stockroom-api errors (in app)                                          │
//! │  └── ApiError         - What HTTP clients see (JSON envelope)           │
//! │                                                                         │
//! │  Flow: ValidationError → FieldErrors → CoreError → DbError → ApiError   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (entity, id, stock levels)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to exactly one HTTP status in the API

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::access::Operation;
use crate::types::Role;

// =============================================================================
// Entity Kind
// =============================================================================

/// The persisted entities, used to qualify NotFound / Conflict / InUse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Unit,
    ItemType,
    Item,
    Transaction,
}

impl EntityKind {
    /// Human-readable name used in error messages.
    pub const fn label(&self) -> &'static str {
        match self {
            EntityKind::User => "User",
            EntityKind::Unit => "Unit",
            EntityKind::ItemType => "Item type",
            EntityKind::Item => "Item",
            EntityKind::Transaction => "Transaction",
        }
    }

    /// Plural, lowercase form ("items", "transactions").
    pub const fn plural(&self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Unit => "units",
            EntityKind::ItemType => "item types",
            EntityKind::Item => "items",
            EntityKind::Transaction => "transactions",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every fallible operation in the system ends in one of these variants
/// (storage failures are added on top by `DbError`).
#[derive(Debug, Error)]
pub enum CoreError {
    /// One or more request fields broke a rule.
    ///
    /// Carries every violation of the request, keyed by field name.
    #[error("Validation failed: {0}")]
    ValidationFailed(FieldErrors),

    /// A looked-up or referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    /// A unique name is already taken by another record.
    #[error("{entity} with {field} '{value}' already exists")]
    Conflict {
        entity: EntityKind,
        field: String,
        value: String,
    },

    /// Delete refused because other records still reference this one.
    #[error("{entity} is still used by {count} {}", .dependents.plural())]
    InUse {
        entity: EntityKind,
        dependents: EntityKind,
        count: i64,
    },

    /// Outflow larger than the current stock.
    ///
    /// ## User Workflow
    /// ```text
    /// POST /transactions { type: out, quantity: 8 }
    ///      │
    ///      ▼
    /// Check stock: current=5
    ///      │
    ///      ▼
    /// InsufficientStock { current_stock: 5, required: 8 }
    ///      │
    ///      ▼
    /// 400 "Insufficient stock: current 5, required 8"
    /// ```
    #[error("Insufficient stock: current {current_stock}, required {required}")]
    InsufficientStock { current_stock: i64, required: i64 },

    /// Role string outside the three known roles.
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    /// Image file extension is not .jpg, .jpeg or .png.
    #[error("Invalid image format '{filename}': only .jpg, .jpeg and .png are allowed")]
    InvalidImageFormat { filename: String },

    /// Image file is larger than the upload limit.
    #[error("Image too large: {size} bytes (max {max} bytes)")]
    ImageTooLarge { size: u64, max: u64 },

    /// The image store could not persist the file.
    #[error("Image upload failed: {0}")]
    UploadFailed(String),

    /// Transaction type filter outside {in, out}.
    #[error("Invalid transaction type: {0}")]
    InvalidTransactionType(String),

    /// Report start date after end date.
    #[error("Invalid date range: start date {start} is after end date {end}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// Missing or invalid credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but the role may not perform the operation.
    #[error("Role {role} is not allowed to perform {operation}")]
    Forbidden { role: Role, operation: Operation },
}

impl CoreError {
    /// Shorthand for [`CoreError::NotFound`].
    pub fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for a single-field [`CoreError::ValidationFailed`].
    pub fn invalid_field(err: ValidationError) -> Self {
        let mut errors = FieldErrors::default();
        errors.push(err);
        CoreError::ValidationFailed(errors)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// One variant describes one broken rule of one field. Several of them are
/// collected into [`FieldErrors`] before being raised.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Numeric value below its lower bound.
    #[error("{field} must be at least {min}")]
    TooSmall { field: String, min: i64 },

    /// Numeric value above its upper bound.
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: i64 },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {}", .allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Name of the field this error belongs to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooSmall { field, .. }
            | ValidationError::TooLarge { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

// =============================================================================
// Field Errors
// =============================================================================

/// Field name → message map for one rejected request.
///
/// ## Usage
/// ```rust
/// use stockroom_core::FieldErrors;
/// use stockroom_core::validation::{validate_password, validate_username};
///
/// let mut errors = FieldErrors::default();
/// errors.check(validate_username("bob"));
/// errors.check(validate_password("short"));
///
/// assert_eq!(errors.len(), 2);
/// assert!(errors.into_result().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Records a failed rule. The first message per field wins.
    pub fn push(&mut self, err: ValidationError) {
        self.0
            .entry(err.field().to_string())
            .or_insert_with(|| err.to_string());
    }

    /// Records the error of `result`, if any.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(err) = result {
            self.push(err);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was recorded, else `ValidationFailed`.
    pub fn into_result(self) -> CoreResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CoreError::ValidationFailed(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            current_stock: 5,
            required: 8,
        };
        assert_eq!(err.to_string(), "Insufficient stock: current 5, required 8");

        let err = CoreError::InUse {
            entity: EntityKind::Unit,
            dependents: EntityKind::Item,
            count: 3,
        };
        assert_eq!(err.to_string(), "Unit is still used by 3 items");

        let err = CoreError::not_found(EntityKind::ItemType, "abc");
        assert_eq!(err.to_string(), "Item type not found: abc");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "item_name".to_string(),
        };
        assert_eq!(err.to_string(), "item_name is required");
        assert_eq!(err.field(), "item_name");

        let err = ValidationError::TooShort {
            field: "username".to_string(),
            min: 5,
        };
        assert_eq!(err.to_string(), "username must be at least 5 characters");
    }

    #[test]
    fn test_field_errors_collects_every_field() {
        let mut errors = FieldErrors::default();
        errors.check(Ok(()));
        errors.push(ValidationError::Required {
            field: "a".to_string(),
        });
        errors.push(ValidationError::TooSmall {
            field: "b".to_string(),
            min: 1,
        });
        // second error for the same field is ignored
        errors.push(ValidationError::TooSmall {
            field: "a".to_string(),
            min: 1,
        });

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("a"), Some("a is required"));
        assert_eq!(errors.to_string(), "a: a is required; b: b must be at least 1");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["b"], "b must be at least 1");

        assert!(matches!(
            errors.into_result(),
            Err(CoreError::ValidationFailed(_))
        ));
        assert!(FieldErrors::default().into_result().is_ok());
    }
}
