//! Transactional execution shared by every provider.
//!
//! A call runs `Connected -> [TxOpen] -> Executed -> [Committed | RolledBack] -> Released`.
//! There is no retry: any failure goes to rollback (inside a transaction) and
//! then back to the caller. The session is owned by the call and released on
//! every path.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::error::DalError;
use crate::settings::ExecutionSettings;
use crate::types::{DalValue, DatabaseType};

/// One open provider connection for the duration of one call.
#[async_trait]
pub trait Session: Send {
    type Parameter: Send;

    async fn begin(&mut self) -> Result<(), DalError>;

    async fn commit(&mut self) -> Result<(), DalError>;

    /// Best effort: must succeed when no transaction is open any more.
    async fn rollback(&mut self) -> Result<(), DalError>;

    async fn execute(
        &mut self,
        sql: &str,
        params: Vec<Self::Parameter>,
        timeout: Option<Duration>,
    ) -> Result<(), DalError>;

    async fn scalar(
        &mut self,
        sql: &str,
        params: Vec<Self::Parameter>,
        timeout: Option<Duration>,
    ) -> Result<Option<DalValue>, DalError>;

    /// Close the connection. The default simply drops it.
    async fn release(self)
    where
        Self: Sized,
    {
    }
}

/// What the statement should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NonQuery,
    Scalar,
}

async fn dispatch<S: Session>(
    session: &mut S,
    command: Command,
    sql: &str,
    params: Vec<S::Parameter>,
    timeout: Option<Duration>,
) -> Result<Option<DalValue>, DalError> {
    match command {
        Command::NonQuery => session.execute(sql, params, timeout).await.map(|()| None),
        Command::Scalar => session.scalar(sql, params, timeout).await,
    }
}

async fn run_in_transaction<S: Session>(
    session: &mut S,
    command: Command,
    sql: &str,
    params: Vec<S::Parameter>,
    timeout: Option<Duration>,
) -> Result<Option<DalValue>, DalError> {
    session.begin().await?;

    let outcome = match dispatch(session, command, sql, params, timeout).await {
        Ok(value) => session.commit().await.map(|()| value),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(value) => Ok(value),
        Err(original) => {
            warn!(error = %original, "statement failed inside transaction; rolling back");
            match session.rollback().await {
                Ok(()) => Err(original),
                Err(rollback) => {
                    error!(error = %rollback, "rollback failed");
                    Err(DalError::RollbackFailed {
                        original: Box::new(original),
                        rollback: Box::new(rollback),
                    })
                }
            }
        }
    }
}

/// Run one statement on an open session and release it.
///
/// # Errors
/// Returns the statement, commit or begin failure; when rollback of a failed
/// transaction also fails, `DalError::RollbackFailed` carries both.
pub async fn run<S: Session>(
    mut session: S,
    provider: DatabaseType,
    command: Command,
    sql: &str,
    settings: &ExecutionSettings,
    params: Vec<S::Parameter>,
) -> Result<Option<DalValue>, DalError> {
    let timeout = settings.command_timeout();
    debug!(
        %provider,
        ?command,
        use_transaction = settings.use_transaction,
        timeout_secs = settings.command_timeout_seconds,
        params = params.len(),
        sql_len = sql.len(),
        "executing statement"
    );

    let result = if settings.use_transaction {
        run_in_transaction(&mut session, command, sql, params, timeout).await
    } else {
        dispatch(&mut session, command, sql, params, timeout).await
    };

    session.release().await;
    debug!(%provider, ok = result.is_ok(), "connection released");
    result
}

/// Await `fut`, giving up after `timeout` with `DalError::Timeout`.
///
/// # Errors
/// Returns the future's own error or `DalError::Timeout`.
pub async fn with_timeout<T, F>(timeout: Option<Duration>, fut: F) -> Result<T, DalError>
where
    F: Future<Output = Result<T, DalError>>,
{
    match timeout {
        None => fut.await,
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| DalError::Timeout {
                seconds: u32::try_from(limit.as_secs()).unwrap_or(u32::MAX),
            })?,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct ScriptedSession {
        fail_execute: bool,
        fail_commit: bool,
        fail_rollback: bool,
        log: Vec<&'static str>,
    }

    #[async_trait]
    impl Session for ScriptedSession {
        type Parameter = ();

        async fn begin(&mut self) -> Result<(), DalError> {
            self.log.push("begin");
            Ok(())
        }

        async fn commit(&mut self) -> Result<(), DalError> {
            self.log.push("commit");
            if self.fail_commit {
                return Err(DalError::TransactionError("commit refused".into()));
            }
            Ok(())
        }

        async fn rollback(&mut self) -> Result<(), DalError> {
            self.log.push("rollback");
            if self.fail_rollback {
                return Err(DalError::TransactionError("rollback refused".into()));
            }
            Ok(())
        }

        async fn execute(
            &mut self,
            _sql: &str,
            _params: Vec<()>,
            _timeout: Option<Duration>,
        ) -> Result<(), DalError> {
            self.log.push("execute");
            if self.fail_execute {
                return Err(DalError::ExecutionError("boom".into()));
            }
            Ok(())
        }

        async fn scalar(
            &mut self,
            _sql: &str,
            _params: Vec<()>,
            _timeout: Option<Duration>,
        ) -> Result<Option<DalValue>, DalError> {
            self.log.push("scalar");
            Ok(Some(DalValue::I64(1)))
        }
    }

    async fn drive(
        session: &mut ScriptedSession,
        settings: ExecutionSettings,
    ) -> Result<Option<DalValue>, DalError> {
        if settings.use_transaction {
            run_in_transaction(session, Command::NonQuery, "x", Vec::new(), None).await
        } else {
            dispatch(session, Command::NonQuery, "x", Vec::new(), None).await
        }
    }

    #[tokio::test]
    async fn commits_after_successful_statement() {
        let mut session = ScriptedSession::default();
        drive(&mut session, ExecutionSettings::new(true, 0)).await.unwrap();
        assert_eq!(session.log, ["begin", "execute", "commit"]);
    }

    #[tokio::test]
    async fn statement_failure_rolls_back_and_surfaces_original() {
        let mut session = ScriptedSession {
            fail_execute: true,
            ..Default::default()
        };
        let err = drive(&mut session, ExecutionSettings::new(true, 0)).await.unwrap_err();
        assert!(matches!(err, DalError::ExecutionError(ref m) if m == "boom"));
        assert_eq!(session.log, ["begin", "execute", "rollback"]);
    }

    #[tokio::test]
    async fn commit_failure_rolls_back() {
        let mut session = ScriptedSession {
            fail_commit: true,
            ..Default::default()
        };
        let err = drive(&mut session, ExecutionSettings::new(true, 0)).await.unwrap_err();
        assert!(matches!(err, DalError::TransactionError(_)));
        assert_eq!(session.log, ["begin", "execute", "commit", "rollback"]);
    }

    #[tokio::test]
    async fn rollback_failure_keeps_both_errors() {
        let mut session = ScriptedSession {
            fail_execute: true,
            fail_rollback: true,
            ..Default::default()
        };
        let err = drive(&mut session, ExecutionSettings::new(true, 0)).await.unwrap_err();
        match &err {
            DalError::RollbackFailed { original, rollback } => {
                assert!(matches!(**original, DalError::ExecutionError(_)));
                assert!(matches!(**rollback, DalError::TransactionError(_)));
            }
            other => panic!("expected composite error, got {other:?}"),
        }
        assert!(matches!(err.original(), DalError::ExecutionError(_)));
    }

    #[tokio::test]
    async fn no_transaction_means_no_boundary() {
        let mut session = ScriptedSession {
            fail_execute: true,
            ..Default::default()
        };
        assert!(drive(&mut session, ExecutionSettings::new(false, 0)).await.is_err());
        assert_eq!(session.log, ["execute"]);
    }

    #[tokio::test]
    async fn run_returns_scalar_and_releases() {
        let settings = ExecutionSettings::new(true, 5);
        let value = run(
            ScriptedSession::default(),
            DatabaseType::Sqlite,
            Command::Scalar,
            "select 1",
            &settings,
            Vec::new(),
        )
        .await
        .unwrap();
        assert_eq!(value, Some(DalValue::I64(1)));
    }

    #[tokio::test]
    async fn with_timeout_reports_the_limit() {
        let err = with_timeout(Some(Duration::from_millis(10)), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<(), DalError>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, DalError::Timeout { seconds: 0 }));
        assert!(err.is_timeout());
    }
}
