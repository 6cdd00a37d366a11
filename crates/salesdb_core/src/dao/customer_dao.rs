//! Customer and purchase-order queries.
//!
//! # Responsibility
//! - Run the five customer queries against a borrowed connection.
//! - Map `CUSTOMER` rows into `Customer` records.
//!
//! # Invariants
//! - Parameters are bound positionally, never interpolated into SQL text.
//! - Statements are prepared uncached so they are finalized with the call.
//! - Every failure is logged at error level before it is returned.

use super::{DaoResult, DataAccessError};
use crate::db::ConnectionProvider;
use crate::logging::EventLogger;
use crate::model::customer::{Customer, CustomerId};
use rusqlite::{params, Connection, Row, Rows};
use std::fmt::Display;
use std::time::Instant;

const COUNT_CUSTOMERS_SQL: &str = "SELECT COUNT(*) AS NUMBER FROM CUSTOMER";
const DELETE_CUSTOMER_SQL: &str = "DELETE FROM CUSTOMER WHERE CUSTOMER_ID = ?";
const COUNT_ORDERS_SQL: &str =
    "SELECT COUNT(*) AS NOMBRE_BONS_COMMANDE FROM PURCHASE_ORDER WHERE CUSTOMER_ID = ?";
const FIND_CUSTOMER_SQL: &str = "SELECT * FROM CUSTOMER WHERE CUSTOMER_ID = ?";
const CUSTOMERS_IN_STATE_SQL: &str = "SELECT * FROM CUSTOMER WHERE STATE = ?";

/// Query contract over the `CUSTOMER` and `PURCHASE_ORDER` tables.
pub trait CustomerRepository {
    /// Number of rows in `CUSTOMER`.
    fn count_customers(&self) -> DaoResult<i64>;
    /// Deletes one customer. Returns affected rows: `1`, or `0` if absent.
    fn delete_customer(&self, id: CustomerId) -> DaoResult<usize>;
    /// Number of purchase orders referencing `id`; `0` when there are none.
    fn count_orders_for_customer(&self, id: CustomerId) -> DaoResult<i64>;
    fn find_customer(&self, id: CustomerId) -> DaoResult<Option<Customer>>;
    /// Customers whose `STATE` equals `state`, in store order.
    fn customers_in_state(&self, state: &str) -> DaoResult<Vec<Customer>>;
}

/// `CustomerRepository` over any `ConnectionProvider`.
///
/// Holds no per-call state; concurrent callers each borrow their own
/// connection from the provider.
#[derive(Debug)]
pub struct CustomerDao<P> {
    provider: P,
    logger: EventLogger,
}

impl<P: ConnectionProvider> CustomerDao<P> {
    /// Creates a DAO that logs through the process-wide `log` backend.
    pub fn new(provider: P) -> Self {
        Self::with_logger(provider, EventLogger::global())
    }

    pub fn with_logger(provider: P, logger: EventLogger) -> Self {
        Self { provider, logger }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Runs `query` on a freshly acquired connection.
    ///
    /// The handle is dropped when the match arm ends, so the connection is
    /// released before the outcome is logged and returned.
    fn run<T>(
        &self,
        operation: &'static str,
        context: impl Display,
        query: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> DaoResult<T> {
        let started_at = Instant::now();
        let outcome = match self.provider.acquire() {
            Ok(handle) => {
                query(&*handle).map_err(|err| DataAccessError::from_sqlite(operation, err))
            }
            Err(err) => Err(DataAccessError::from_provider(operation, err)),
        };

        match &outcome {
            Ok(_) => self.logger.debug(format_args!(
                "event={} module=dao status=ok {} duration_ms={}",
                operation,
                context,
                started_at.elapsed().as_millis()
            )),
            Err(err) => self.logger.error(format_args!(
                "event={} module=dao status=error {} duration_ms={} error={}",
                operation,
                context,
                started_at.elapsed().as_millis(),
                err
            )),
        }

        outcome
    }
}

impl<P: ConnectionProvider> CustomerRepository for CustomerDao<P> {
    fn count_customers(&self) -> DaoResult<i64> {
        self.run("customer_count", "scope=all", |conn| {
            let mut stmt = conn.prepare(COUNT_CUSTOMERS_SQL)?;
            let mut rows = stmt.query([])?;
            let count = read_single_count(&mut rows, "NUMBER")?;
            Ok(count)
        })
    }

    fn delete_customer(&self, id: CustomerId) -> DaoResult<usize> {
        self.run("customer_delete", format_args!("customer_id={id}"), |conn| {
            let mut stmt = conn.prepare(DELETE_CUSTOMER_SQL)?;
            let affected = stmt.execute(params![id])?;
            Ok(affected)
        })
    }

    fn count_orders_for_customer(&self, id: CustomerId) -> DaoResult<i64> {
        self.run("order_count", format_args!("customer_id={id}"), |conn| {
            let mut stmt = conn.prepare(COUNT_ORDERS_SQL)?;
            let mut rows = stmt.query(params![id])?;
            let count = read_single_count(&mut rows, "NOMBRE_BONS_COMMANDE")?;
            Ok(count)
        })
    }

    fn find_customer(&self, id: CustomerId) -> DaoResult<Option<Customer>> {
        self.run("customer_find", format_args!("customer_id={id}"), |conn| {
            let mut stmt = conn.prepare(FIND_CUSTOMER_SQL)?;
            let mut rows = stmt.query(params![id])?;
            let customer = match rows.next()? {
                Some(row) => Some(parse_customer_row(row)?),
                None => None,
            };
            Ok(customer)
        })
    }

    fn customers_in_state(&self, state: &str) -> DaoResult<Vec<Customer>> {
        self.run("customer_list_by_state", format_args!("state={state}"), |conn| {
            let mut stmt = conn.prepare(CUSTOMERS_IN_STATE_SQL)?;
            let mut rows = stmt.query(params![state])?;
            let mut customers = Vec::new();
            while let Some(row) = rows.next()? {
                customers.push(parse_customer_row(row)?);
            }
            Ok(customers)
        })
    }
}

/// Reads the aggregate column of a `COUNT(*)` query, which yields exactly one row.
fn read_single_count(rows: &mut Rows<'_>, column: &str) -> rusqlite::Result<i64> {
    match rows.next()? {
        Some(row) => row.get(column),
        None => Err(rusqlite::Error::QueryReturnedNoRows),
    }
}

fn parse_customer_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    let id: CustomerId = row.get("CUSTOMER_ID")?;
    let name: String = row.get("NAME")?;
    let address_line1: String = row.get("ADDRESSLINE1")?;
    Ok(Customer::new(id, name, address_line1))
}
