//! Data access layer over the sales database.
//!
//! # Responsibility
//! - Translate typed calls into parameterized SQL and rows into records.
//! - Surface every store failure as one error type, `DataAccessError`.
//!
//! # Invariants
//! - One connection, one prepared statement and at most one cursor per call,
//!   all released before the call returns.
//! - "No match" is never an error: it is `0`, `None` or an empty `Vec`.

use crate::db::ProviderError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod customer_dao;

pub type DaoResult<T> = Result<T, DataAccessError>;

/// Uniform failure of a data-access operation.
///
/// Keeps only the message of the underlying failure so driver and pool
/// error types stay internal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataAccessError {
    operation: &'static str,
    message: String,
}

impl DataAccessError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }

    /// Name of the operation that failed, e.g. `customer_find`.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Message of the underlying failure.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn from_provider(operation: &'static str, err: ProviderError) -> Self {
        Self::new(operation, err.to_string())
    }

    pub(crate) fn from_sqlite(operation: &'static str, err: rusqlite::Error) -> Self {
        Self::new(operation, err.to_string())
    }
}

impl Display for DataAccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for DataAccessError {}
