#![allow(dead_code)]

use log::{Level, Log, Metadata, Record};
use rusqlite::Connection;
use salesdb_core::{ConnectionProvider, DbConfig, ProviderResult, SqliteFileProvider};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const SCHEMA_SQL: &str = "
CREATE TABLE CUSTOMER (
    CUSTOMER_ID INTEGER PRIMARY KEY,
    NAME TEXT,
    ADDRESSLINE1 TEXT,
    STATE TEXT
);
CREATE TABLE PURCHASE_ORDER (
    ORDER_NUM INTEGER PRIMARY KEY,
    CUSTOMER_ID INTEGER NOT NULL REFERENCES CUSTOMER (CUSTOMER_ID),
    QUANTITY INTEGER NOT NULL
);";

const SEED_SQL: &str = "
INSERT INTO CUSTOMER VALUES (1, 'Jumbo Eagle Corp', '111 E. Las Olivas Blvd', 'FL');
INSERT INTO CUSTOMER VALUES (2, 'New Enterprises', '9754 Main Street', 'FL');
INSERT INTO CUSTOMER VALUES (7, 'Acme', '1 Main St', 'CA');
INSERT INTO CUSTOMER VALUES (25, 'Wren Computers', '8989 Red Albatross Drive', 'TX');
INSERT INTO CUSTOMER VALUES (36, 'Bob Hosting Corp.', '65653 Lake Road', 'CA');
INSERT INTO CUSTOMER VALUES (50, NULL, '3 Unnamed Way', 'NV');
INSERT INTO PURCHASE_ORDER VALUES (10398001, 1, 10);
INSERT INTO PURCHASE_ORDER VALUES (10398002, 1, 8);
INSERT INTO PURCHASE_ORDER VALUES (20198001, 25, 75);";

pub const SEEDED_CUSTOMERS: i64 = 6;

/// On-disk sales database that lives as long as the value.
pub struct Store {
    _dir: TempDir,
    path: PathBuf,
}

impl Store {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> DbConfig {
        DbConfig::new(&self.path)
    }

    pub fn direct_provider(&self) -> SqliteFileProvider {
        SqliteFileProvider::new(self.config())
    }

    /// Side connection for assertions, outside any provider.
    pub fn inspect(&self) -> Connection {
        Connection::open(&self.path).unwrap()
    }

    pub fn row_count(&self, table: &str) -> i64 {
        self.inspect()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .unwrap()
    }

    /// True when no other connection holds a lock on the database file.
    pub fn can_lock_exclusively(&self) -> bool {
        let conn = self.inspect();
        conn.busy_timeout(std::time::Duration::ZERO).unwrap();
        let locked = conn.execute_batch("BEGIN EXCLUSIVE;").is_ok();
        if locked {
            conn.execute_batch("ROLLBACK;").unwrap();
        }
        locked
    }
}

pub fn seeded_store() -> Store {
    let store = empty_store();
    store
        .inspect()
        .execute_batch(&format!("{SCHEMA_SQL}{SEED_SQL}"))
        .unwrap();
    store
}

/// A database file that exists but has no tables.
pub fn empty_store() -> Store {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sales.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE scratch (x INTEGER); DROP TABLE scratch;")
        .unwrap();
    Store { _dir: dir, path }
}

/// Provider wrapper that tracks how many handles are handed out and alive.
pub struct CountingProvider<P> {
    inner: P,
    acquired: Arc<AtomicUsize>,
    outstanding: Arc<AtomicUsize>,
}

impl<P> CountingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            acquired: Arc::new(AtomicUsize::new(0)),
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }
}

pub struct Tracked<H> {
    handle: H,
    outstanding: Arc<AtomicUsize>,
}

impl<H: Deref<Target = Connection>> Deref for Tracked<H> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &*self.handle
    }
}

impl<H> Drop for Tracked<H> {
    fn drop(&mut self) {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<P: ConnectionProvider> ConnectionProvider for CountingProvider<P> {
    type Handle = Tracked<P::Handle>;

    fn acquire(&self) -> ProviderResult<Self::Handle> {
        let handle = self.inner.acquire()?;
        self.acquired.fetch_add(1, Ordering::SeqCst);
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        Ok(Tracked {
            handle,
            outstanding: Arc::clone(&self.outstanding),
        })
    }
}

/// In-memory `log` sink that records every line.
#[derive(Default)]
pub struct CapturedLog {
    lines: Mutex<Vec<(Level, String)>>,
}

impl CapturedLog {
    pub fn lines_at(&self, level: Level) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(line_level, _)| *line_level == level)
            .map(|(_, line)| line.clone())
            .collect()
    }
}

impl Log for CapturedLog {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.lines
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}
