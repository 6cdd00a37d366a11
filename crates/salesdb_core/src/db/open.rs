//! Direct SQLite connections, one per acquisition.
//!
//! # Invariants
//! - The database file must already exist; acquisition never creates it.
//! - Returned connections carry the pragmas from `DbConfig`.

use super::{configure_connection, ConnectionProvider, DbConfig, ProviderResult};
use log::error;
use rusqlite::{Connection, OpenFlags};
use std::ops::Deref;
use std::time::Instant;

/// Owned connection closed when dropped.
#[derive(Debug)]
pub struct DirectConnection(Connection);

impl Deref for DirectConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.0
    }
}

/// Opens a fresh connection to a database file on every `acquire()`.
#[derive(Debug, Clone)]
pub struct SqliteFileProvider {
    config: DbConfig,
}

impl SqliteFileProvider {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }
}

impl ConnectionProvider for SqliteFileProvider {
    type Handle = DirectConnection;

    fn acquire(&self) -> ProviderResult<DirectConnection> {
        let started_at = Instant::now();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = match Connection::open_with_flags(&self.config.path, flags) {
            Ok(conn) => conn,
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        if let Err(err) = configure_connection(&conn, &self.config) {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=db_configure_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }

        Ok(DirectConnection(conn))
    }
}
