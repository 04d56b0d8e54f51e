use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{Connection, ErrorCode, InterruptHandle};
use tracing::{debug, warn};

use super::config::{SharedSqliteConnection, SqliteOptions};
use super::params::SqliteParameter;
use super::query;
use crate::engine::Session;
use crate::error::DalError;
use crate::types::DalValue;

pub(crate) async fn run_blocking<F, R>(conn: SharedSqliteConnection, func: F) -> Result<R, DalError>
where
    F: FnOnce(&mut Connection) -> Result<R, DalError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| DalError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}

fn is_interrupt(err: &DalError) -> bool {
    matches!(
        err,
        DalError::SqliteError(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::OperationInterrupted
    )
}

/// Open a connection off the async runtime.
///
/// # Errors
/// Returns `DalError::ConnectionError` if the database cannot be opened.
pub async fn open(
    options: SqliteOptions,
    create: bool,
    busy_timeout: Option<Duration>,
) -> Result<Connection, DalError> {
    tokio::task::spawn_blocking(move || options.open(create, busy_timeout))
        .await
        .map_err(|e| DalError::ConnectionError(format!("sqlite spawn_blocking join error: {e}")))?
}

/// One `SQLite` connection driven by the execution engine.
pub struct SqliteSession {
    conn: SharedSqliteConnection,
    interrupt: Arc<InterruptHandle>,
}

impl SqliteSession {
    #[must_use]
    pub fn new(conn: Connection) -> Self {
        let interrupt = Arc::new(conn.get_interrupt_handle());
        Self {
            conn: Arc::new(tokio::sync::Mutex::new(conn)),
            interrupt,
        }
    }

    fn conn_handle(&self) -> SharedSqliteConnection {
        Arc::clone(&self.conn)
    }

    /// Run `func` with a watchdog that interrupts the connection once `timeout` elapses.
    async fn run_with_timeout<F, R>(&self, timeout: Option<Duration>, func: F) -> Result<R, DalError>
    where
        F: FnOnce(&mut Connection) -> Result<R, DalError> + Send + 'static,
        R: Send + 'static,
    {
        let Some(limit) = timeout else {
            return run_blocking(self.conn_handle(), func).await;
        };

        let fired = Arc::new(AtomicBool::new(false));
        let watchdog = {
            let fired = Arc::clone(&fired);
            let interrupt = Arc::clone(&self.interrupt);
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                fired.store(true, Ordering::SeqCst);
                interrupt.interrupt();
            })
        };

        let result = run_blocking(self.conn_handle(), func).await;
        watchdog.abort();

        match result {
            Err(e) if fired.load(Ordering::SeqCst) && is_interrupt(&e) => Err(DalError::Timeout {
                seconds: u32::try_from(limit.as_secs()).unwrap_or(u32::MAX),
            }),
            other => other,
        }
    }
}

#[async_trait]
impl Session for SqliteSession {
    type Parameter = SqliteParameter;

    async fn begin(&mut self) -> Result<(), DalError> {
        run_blocking(self.conn_handle(), |conn| {
            conn.execute_batch("BEGIN")
                .map_err(|e| DalError::TransactionError(format!("SQLite begin error: {e}")))
        })
        .await
    }

    async fn commit(&mut self) -> Result<(), DalError> {
        run_blocking(self.conn_handle(), |conn| {
            conn.execute_batch("COMMIT")
                .map_err(|e| DalError::TransactionError(format!("SQLite commit error: {e}")))
        })
        .await
    }

    async fn rollback(&mut self) -> Result<(), DalError> {
        run_blocking(self.conn_handle(), |conn| {
            // Interrupts and some constraint failures end the transaction on their own.
            if conn.is_autocommit() {
                debug!("SQLite transaction already closed; nothing to roll back");
                return Ok(());
            }
            conn.execute_batch("ROLLBACK")
                .map_err(|e| DalError::TransactionError(format!("SQLite rollback error: {e}")))
        })
        .await
    }

    async fn execute(
        &mut self,
        sql: &str,
        params: Vec<SqliteParameter>,
        timeout: Option<Duration>,
    ) -> Result<(), DalError> {
        let sql_owned = sql.to_owned();
        self.run_with_timeout(timeout, move |conn| query::execute(conn, &sql_owned, &params))
            .await
    }

    async fn scalar(
        &mut self,
        sql: &str,
        params: Vec<SqliteParameter>,
        timeout: Option<Duration>,
    ) -> Result<Option<DalValue>, DalError> {
        let sql_owned = sql.to_owned();
        self.run_with_timeout(timeout, move |conn| query::scalar(conn, &sql_owned, &params))
            .await
    }

    async fn release(self) {
        let Ok(mutex) = Arc::try_unwrap(self.conn) else {
            return;
        };
        let closed = tokio::task::spawn_blocking(move || mutex.into_inner().close()).await;
        match closed {
            Ok(Ok(())) => {}
            Ok(Err((_conn, e))) => warn!(error = %e, "closing SQLite connection failed"),
            Err(e) => warn!(error = %e, "sqlite spawn_blocking join error on close"),
        }
    }
}
