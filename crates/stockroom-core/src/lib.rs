//! # stockroom-core: Pure Inventory Logic for Stockroom
//!
//! This crate holds every inventory rule as plain functions and data types,
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    stockroom-api (axum)                         │   │
//! │  │    /auth  /items  /master-data  /transactions  /reports         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockroom-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   stock   │  │  access   │  │ validation│  │   │
//! │  │   │   Item    │  │ outflow   │  │ Operation │  │  fields   │  │   │
//! │  │   │   User    │  │ reversal  │  │ authorize │  │  images   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐                                 │   │
//! │  │   │pagination │  │  report   │                                 │   │
//! │  │   └───────────┘  └───────────┘                                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  stockroom-db (Database Layer)                  │   │
//! │  │          SQLite queries, migrations, repositories               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (User, Unit, ItemType, Item, Transaction)
//! - [`requests`] - Validated input payloads for create/update operations
//! - [`stock`] - Stock arithmetic: outflow checks, reversal, clamping
//! - [`access`] - Role capability table and the authorization gate
//! - [`pagination`] - Offset/limit normalisation and page metadata
//! - [`report`] - Report rows, report filters, inventory summary shaping
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::stock::{check_outflow, reverse_delta};
//! use stockroom_core::TransactionKind;
//!
//! // 10 in stock, taking 8 out is fine
//! assert!(check_outflow(10, 8).is_ok());
//! // taking 11 out is not
//! assert!(check_outflow(10, 11).is_err());
//!
//! // deleting an "in" of 10 when only 2 remain clamps at zero
//! let reversal = reverse_delta(2, TransactionKind::In, 10);
//! assert_eq!(reversal.resulting_stock, 0);
//! assert!(reversal.clamped);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod error;
pub mod pagination;
pub mod report;
pub mod requests;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use access::{authorize, Operation};
pub use error::{CoreError, CoreResult, EntityKind, FieldErrors, ValidationError};
pub use pagination::{Page, PageRequest, Pagination};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Minimum username length (characters).
pub const MIN_USERNAME_LEN: usize = 5;

/// Minimum password length (characters).
pub const MIN_PASSWORD_LEN: usize = 8;

/// Minimum unit name length (characters).
pub const MIN_UNIT_NAME_LEN: usize = 2;

/// Minimum item-type name length (characters).
pub const MIN_ITEM_TYPE_NAME_LEN: usize = 3;

/// Largest accepted image upload (5 MiB).
pub const MAX_IMAGE_BYTES: u64 = 5 << 20;

/// Image extensions accepted by the upload check (compared lowercase).
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png"];

/// Page size used when the caller gives none.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Warning attached to a transaction deletion that had to clamp stock at zero.
pub const CLAMPED_STOCK_WARNING: &str =
    "stock adjusted to 0 because deletion would otherwise produce negative stock";
