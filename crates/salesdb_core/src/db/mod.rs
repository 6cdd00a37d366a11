//! Connection providers for the external sales database.
//!
//! # Responsibility
//! - Define the capability the data-access layer borrows connections from.
//! - Provide direct (one connection per call) and pooled implementations.
//!
//! # Invariants
//! - Dropping a handle releases its connection (closed or returned to pool).
//! - Providers never create or migrate schema; the store must already exist.

use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

mod open;
mod pool;

pub use open::{DirectConnection, SqliteFileProvider};
pub use pool::{PoolConfig, PooledProvider};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failure to hand out a usable connection.
#[derive(Debug)]
pub enum ProviderError {
    Sqlite(rusqlite::Error),
    Pool(r2d2::Error),
    Unavailable(String),
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Pool(err) => write!(f, "connection pool error: {err}"),
            Self::Unavailable(message) => write!(f, "connection unavailable: {message}"),
        }
    }
}

impl Error for ProviderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Pool(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for ProviderError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<r2d2::Error> for ProviderError {
    fn from(value: r2d2::Error) -> Self {
        Self::Pool(value)
    }
}

/// Source of short-lived connections.
///
/// Implementations own pooling and concurrency of issuance. Callers hold a
/// handle only for the duration of one operation.
pub trait ConnectionProvider {
    type Handle: Deref<Target = Connection>;

    /// Acquires a connection. May block, may fail.
    fn acquire(&self) -> ProviderResult<Self::Handle>;
}

impl<P: ConnectionProvider + ?Sized> ConnectionProvider for &P {
    type Handle = P::Handle;

    fn acquire(&self) -> ProviderResult<Self::Handle> {
        (**self).acquire()
    }
}

impl<P: ConnectionProvider + ?Sized> ConnectionProvider for Arc<P> {
    type Handle = P::Handle;

    fn acquire(&self) -> ProviderResult<Self::Handle> {
        (**self).acquire()
    }
}

/// Settings applied to every connection a provider hands out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub path: PathBuf,
    pub busy_timeout: Duration,
    pub foreign_keys: bool,
}

impl DbConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            foreign_keys: true,
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }
}

/// Applies per-connection pragmas from `config`.
pub(crate) fn configure_connection(conn: &Connection, config: &DbConfig) -> rusqlite::Result<()> {
    let foreign_keys = if config.foreign_keys { "ON" } else { "OFF" };
    conn.execute_batch(&format!("PRAGMA foreign_keys = {foreign_keys};"))?;
    conn.busy_timeout(config.busy_timeout)?;
    Ok(())
}
