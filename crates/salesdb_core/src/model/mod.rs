//! Domain records materialized from the sales database.
//!
//! # Responsibility
//! - Define the in-memory shape of rows read by the data-access layer.
//!
//! # Invariants
//! - Records are immutable once constructed.
//! - The external store stays the source of truth; nothing here is persisted.

pub mod customer;
