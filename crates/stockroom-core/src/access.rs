//! # Access Control
//!
//! One declarative table maps each operation class to the roles allowed to
//! invoke it; [`authorize`] is the only gate.
//!
//! ```text
//! ┌──────────────────────┬───────┬─────────────────┬───────────────────┐
//! │ Operation            │ admin │ warehouse_admin │ warehouse_manager │
//! ├──────────────────────┼───────┼─────────────────┼───────────────────┤
//! │ ManageUsers          │   ✔   │                 │                   │
//! │ ReadMasterData       │   ✔   │        ✔        │         ✔         │
//! │ WriteMasterData      │   ✔   │        ✔        │                   │
//! │ ReadTransactions     │   ✔   │        ✔        │         ✔         │
//! │ WriteTransactions    │   ✔   │        ✔        │                   │
//! │ ReadSummary          │   ✔   │        ✔        │         ✔         │
//! │ GenerateReports      │   ✔   │        ✔        │         ✔         │
//! └──────────────────────┴───────┴─────────────────┴───────────────────┘
//! ```
//! "Master data" covers items, item types and units.

use std::fmt;

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::types::Role;

/// Operation classes subject to role checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ManageUsers,
    ReadMasterData,
    WriteMasterData,
    ReadTransactions,
    WriteTransactions,
    ReadSummary,
    GenerateReports,
}

const EVERYONE: &[Role] = &[Role::Admin, Role::WarehouseAdmin, Role::WarehouseManager];
const WRITERS: &[Role] = &[Role::Admin, Role::WarehouseAdmin];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::ManageUsers,
        Operation::ReadMasterData,
        Operation::WriteMasterData,
        Operation::ReadTransactions,
        Operation::WriteTransactions,
        Operation::ReadSummary,
        Operation::GenerateReports,
    ];

    /// Roles allowed to perform this operation.
    pub const fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Operation::ManageUsers => ADMIN_ONLY,
            Operation::ReadMasterData => EVERYONE,
            Operation::WriteMasterData => WRITERS,
            Operation::ReadTransactions => EVERYONE,
            Operation::WriteTransactions => WRITERS,
            Operation::ReadSummary => EVERYONE,
            Operation::GenerateReports => EVERYONE,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Operation::ManageUsers => "manage_users",
            Operation::ReadMasterData => "read_master_data",
            Operation::WriteMasterData => "write_master_data",
            Operation::ReadTransactions => "read_transactions",
            Operation::WriteTransactions => "write_transactions",
            Operation::ReadSummary => "read_summary",
            Operation::GenerateReports => "generate_reports",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fails with `Forbidden` unless `role` may perform `operation`.
pub fn authorize(role: Role, operation: Operation) -> CoreResult<()> {
    if operation.allowed_roles().contains(&role) {
        Ok(())
    } else {
        Err(CoreError::Forbidden { role, operation })
    }
}
