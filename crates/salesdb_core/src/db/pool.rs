//! r2d2-backed pooled provider.
//!
//! # Invariants
//! - Pool sizing and checkout fairness are left to r2d2.
//! - A pooled handle goes back to the pool when dropped.
//! - Pooled connections open the existing file only; nothing is created.

use super::{configure_connection, ConnectionProvider, DbConfig, ProviderResult};
use log::{error, info};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use std::fmt;
use std::time::Duration;

const DEFAULT_POOL_SIZE: u32 = 8;
const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Pool sizing for `PooledProvider`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_size: u32,
    /// How long `acquire()` waits for a free connection before failing.
    pub connection_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_POOL_SIZE,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
        }
    }
}

/// Connection provider backed by an r2d2 pool.
#[derive(Clone)]
pub struct PooledProvider {
    pool: Pool<SqliteConnectionManager>,
}

impl PooledProvider {
    /// Builds the pool and opens its initial connections.
    ///
    /// # Errors
    /// - Returns `ProviderError::Pool` when initial connections cannot be
    ///   established within `connection_timeout`.
    pub fn open(db: DbConfig, pool: PoolConfig) -> ProviderResult<Self> {
        let path = db.path.clone();
        let manager = SqliteConnectionManager::file(&path)
            .with_flags(
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .with_init(move |conn| configure_connection(conn, &db));

        let pool = Pool::builder()
            .max_size(pool.max_size)
            .connection_timeout(pool.connection_timeout)
            .build(manager)
            .map_err(|err| {
                error!(
                    "event=pool_open module=db status=error path={} error={}",
                    path.display(),
                    err
                );
                err
            })?;

        info!(
            "event=pool_open module=db status=ok path={} max_size={}",
            path.display(),
            pool.max_size()
        );
        Ok(Self { pool })
    }

    /// Returns `(connections, idle_connections)` as reported by r2d2.
    pub fn state(&self) -> (u32, u32) {
        let state = self.pool.state();
        (state.connections, state.idle_connections)
    }
}

impl fmt::Debug for PooledProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (connections, idle) = self.state();
        f.debug_struct("PooledProvider")
            .field("max_size", &self.pool.max_size())
            .field("connections", &connections)
            .field("idle_connections", &idle)
            .finish()
    }
}

impl ConnectionProvider for PooledProvider {
    type Handle = PooledConnection<SqliteConnectionManager>;

    fn acquire(&self) -> ProviderResult<Self::Handle> {
        Ok(self.pool.get()?)
    }
}
