//! # Validation Module
//!
//! Field-level validation rules for Stockroom requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (axum)                                        │
//! │  ├── JSON / query / multipart decoding                                  │
//! │  └── Malformed bodies rejected as ValidationFailed                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Lengths, UUIDs, quantities, dates, image metadata                  │
//! │  └── Every failed field collected into FieldErrors                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Repositories + SQLite                                         │
//! │  ├── Existence of referenced rows (NotFound)                            │
//! │  ├── Uniqueness lookups (Conflict), UNIQUE constraints                  │
//! │  └── Foreign key constraints                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{validate_quantity, validate_unit_name};
//!
//! assert!(validate_unit_name("kg").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::{
    ALLOWED_IMAGE_EXTENSIONS, MAX_IMAGE_BYTES, MIN_ITEM_TYPE_NAME_LEN, MIN_PASSWORD_LEN,
    MIN_UNIT_NAME_LEN, MIN_USERNAME_LEN,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Date format accepted for transaction dates and report bounds.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// String Validators
// =============================================================================

/// Checks that `value` is non-empty and at least `min` characters long.
fn validate_min_chars(field: &str, value: &str, min: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }

    Ok(())
}

/// Username: required, at least 5 characters.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    validate_min_chars("username", username, MIN_USERNAME_LEN)
}

/// Password: required, at least 8 characters.
///
/// Not trimmed: leading/trailing spaces are part of the secret.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(())
}

/// Unit name: required, at least 2 characters.
pub fn validate_unit_name(name: &str) -> ValidationResult<()> {
    validate_min_chars("unit_name", name, MIN_UNIT_NAME_LEN)
}

/// Item-type name: required, at least 3 characters.
pub fn validate_type_name(name: &str) -> ValidationResult<()> {
    validate_min_chars("type_name", name, MIN_ITEM_TYPE_NAME_LEN)
}

/// Item name: required.
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    validate_min_chars("item_name", name, 1)
}

/// Validates a UUID string referenced by a request field.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_uuid;
///
/// assert!(validate_uuid("type_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("type_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(field: &str, raw: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        }
    })
}

/// Parses an optional date bound; an empty string counts as absent.
pub fn parse_optional_date(field: &str, raw: Option<&str>) -> ValidationResult<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(field, value).map(Some),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Transaction quantity: at least 1.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 1 {
        return Err(ValidationError::TooSmall {
            field: "quantity".to_string(),
            min: 1,
        });
    }
    Ok(())
}

/// Minimum stock: zero or more.
pub fn validate_minimum_stock(minimum: i64) -> ValidationResult<()> {
    if minimum < 0 {
        return Err(ValidationError::TooSmall {
            field: "minimum_stock".to_string(),
            min: 0,
        });
    }
    Ok(())
}

// =============================================================================
// Image Validation
// =============================================================================

/// Checks an uploaded image's name and size before it is stored.
///
/// ## Rules
/// - Extension is `.jpg`, `.jpeg` or `.png`, any case
/// - At most 5 MiB
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_image;
///
/// assert!(validate_image("photo.JPG", 1024).is_ok());
/// assert!(validate_image("photo.gif", 1024).is_err());
/// assert!(validate_image("photo.png", 6 * 1024 * 1024).is_err());
/// ```
pub fn validate_image(filename: &str, size: u64) -> CoreResult<()> {
    let ext = image_extension(filename);
    if !ext
        .as_deref()
        .is_some_and(|ext| ALLOWED_IMAGE_EXTENSIONS.contains(&ext))
    {
        return Err(CoreError::InvalidImageFormat {
            filename: filename.to_string(),
        });
    }

    if size > MAX_IMAGE_BYTES {
        return Err(CoreError::ImageTooLarge {
            size,
            max: MAX_IMAGE_BYTES,
        });
    }

    Ok(())
}

/// Lowercased extension of `filename`, including the dot.
pub fn image_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}

// =============================================================================
// Unit Tests
// =============================================================================
