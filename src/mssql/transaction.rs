use std::time::Duration;

use async_trait::async_trait;
use tiberius::Query;
use tracing::{debug, warn};

use super::config::MssqlClient;
use super::params::MssqlParameter;
use super::query;
use crate::engine::{Session, with_timeout};
use crate::error::DalError;
use crate::types::DalValue;

/// One SQL Server connection driven by the execution engine.
///
/// A statement cut off by its timeout leaves the client in the middle of a
/// response; the session is then abandoned and only dropped. The server rolls
/// back whatever transaction was open when the connection goes away.
pub struct MssqlSession {
    client: MssqlClient,
    abandoned: bool,
}

impl MssqlSession {
    #[must_use]
    pub fn new(client: MssqlClient) -> Self {
        Self {
            client,
            abandoned: false,
        }
    }

    fn track<T>(&mut self, result: Result<T, DalError>) -> Result<T, DalError> {
        if matches!(result, Err(DalError::Timeout { .. })) {
            self.abandoned = true;
        }
        result
    }
}

#[async_trait]
impl Session for MssqlSession {
    type Parameter = MssqlParameter;

    async fn begin(&mut self) -> Result<(), DalError> {
        Query::new("BEGIN TRANSACTION")
            .execute(&mut self.client)
            .await
            .map_err(|e| {
                DalError::TransactionError(format!("SQL Server begin transaction error: {e}"))
            })?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DalError> {
        Query::new("COMMIT TRANSACTION")
            .execute(&mut self.client)
            .await
            .map_err(|e| DalError::TransactionError(format!("SQL Server commit error: {e}")))?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DalError> {
        if self.abandoned {
            debug!("skipping rollback on abandoned SQL Server connection");
            return Ok(());
        }
        // Some server errors already abort the transaction.
        Query::new("IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION")
            .execute(&mut self.client)
            .await
            .map_err(|e| DalError::TransactionError(format!("SQL Server rollback error: {e}")))?;
        Ok(())
    }

    async fn execute(
        &mut self,
        sql: &str,
        params: Vec<MssqlParameter>,
        timeout: Option<Duration>,
    ) -> Result<(), DalError> {
        let result = with_timeout(timeout, query::execute(&mut self.client, sql, params)).await;
        self.track(result)
    }

    async fn scalar(
        &mut self,
        sql: &str,
        params: Vec<MssqlParameter>,
        timeout: Option<Duration>,
    ) -> Result<Option<DalValue>, DalError> {
        let result = with_timeout(timeout, query::scalar(&mut self.client, sql, params)).await;
        self.track(result)
    }

    async fn release(self) {
        if self.abandoned {
            return;
        }
        if let Err(e) = self.client.close().await {
            warn!(error = %e, "closing SQL Server connection failed");
        }
    }
}
