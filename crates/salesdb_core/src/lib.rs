//! Data access to the customer / purchase-order sales database.
//!
//! Callers build a `ConnectionProvider` (direct or pooled), hand it to a
//! `CustomerDao`, and query through the `CustomerRepository` trait. Every
//! store failure comes back as a `DataAccessError`.

pub mod dao;
pub mod db;
pub mod logging;
pub mod model;

pub use dao::customer_dao::{CustomerDao, CustomerRepository};
pub use dao::{DaoResult, DataAccessError};
pub use db::{
    ConnectionProvider, DbConfig, DirectConnection, PoolConfig, PooledProvider, ProviderError,
    ProviderResult, SqliteFileProvider,
};
pub use logging::{
    default_log_level, init_logging, logging_status, EventLogger, LoggingConfig, LoggingError,
};
pub use model::customer::{Customer, CustomerId};
