//! Customer record.
//!
//! # Invariants
//! - `id` is assigned by the store, never generated in-process.
//! - Fields are private; a `Customer` cannot change after construction.

use serde::{Deserialize, Serialize};

/// Primary key of the `CUSTOMER` table.
pub type CustomerId = i64;

/// Projection of one `CUSTOMER` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: CustomerId,
    name: String,
    address_line1: String,
}

impl Customer {
    pub fn new(id: CustomerId, name: impl Into<String>, address_line1: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            address_line1: address_line1.into(),
        }
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// First address line (`ADDRESSLINE1`).
    pub fn address_line1(&self) -> &str {
        &self.address_line1
    }
}
