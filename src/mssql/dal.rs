use async_trait::async_trait;
use tracing::warn;

use super::client::connect;
use super::config::parse_config;
use super::params::{MssqlParameter, SqlServerHooks};
use super::transaction::MssqlSession;
use crate::binder;
use crate::dal::{DalSpecificProperties, DataAccessLayer};
use crate::engine::{self, Command, with_timeout};
use crate::error::DalError;
use crate::params::ParameterList;
use crate::settings::ExecutionSettings;
use crate::types::{DalValue, DatabaseType};

static SQL_SERVER_PROPERTIES: DalSpecificProperties = DalSpecificProperties {
    block_delimiter: "GO",
    comment_start: "/*",
    comment_end: "*/",
};

/// SQL Server provider over tiberius.
///
/// Every call opens its own connection from the stored connection string.
#[derive(Debug, Clone)]
pub struct SqlServerDal {
    connection_string: String,
}

impl SqlServerDal {
    #[must_use]
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
        }
    }

    /// Bind `list` into SQL Server parameters without touching the server.
    ///
    /// # Errors
    /// Returns `DalError::TypeMapping` for a parameter whose type has no mapping.
    pub fn bind_parameters(&self, list: &ParameterList) -> Result<Vec<MssqlParameter>, DalError> {
        binder::bind_parameters(&SqlServerHooks, list)
    }

    async fn run(
        &self,
        command: Command,
        sql: &str,
        settings: &ExecutionSettings,
        params: Option<&ParameterList>,
    ) -> Result<Option<DalValue>, DalError> {
        let bound = binder::bind_optional(&SqlServerHooks, params)?;
        let client = with_timeout(settings.command_timeout(), connect(&self.connection_string))
            .await
            .map_err(|e| match e {
                DalError::Timeout { seconds } => DalError::ConnectionError(format!(
                    "SQL Server connection timed out after {seconds}s"
                )),
                other => other,
            })?;
        engine::run(
            MssqlSession::new(client),
            DatabaseType::SqlServer,
            command,
            sql,
            settings,
            bound,
        )
        .await
    }
}

#[async_trait]
impl DataAccessLayer for SqlServerDal {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::SqlServer
    }

    fn specific_properties(&self) -> &DalSpecificProperties {
        &SQL_SERVER_PROPERTIES
    }

    fn connection_string(&self) -> &str {
        &self.connection_string
    }

    async fn execute_non_query(
        &self,
        sql: &str,
        settings: &ExecutionSettings,
        params: Option<&ParameterList>,
    ) -> Result<(), DalError> {
        self.run(Command::NonQuery, sql, settings, params).await?;
        Ok(())
    }

    async fn execute_scalar(
        &self,
        sql: &str,
        settings: &ExecutionSettings,
        params: Option<&ParameterList>,
    ) -> Result<Option<DalValue>, DalError> {
        self.run(Command::Scalar, sql, settings, params).await
    }

    async fn is_connection_valid(
        &self,
        connection_string: &str,
        settings: &ExecutionSettings,
    ) -> bool {
        let attempt = async {
            let client = connect(connection_string).await?;
            client
                .close()
                .await
                .map_err(|e| DalError::ConnectionError(format!("SQL Server close error: {e}")))
        };
        match with_timeout(settings.command_timeout(), attempt).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "SQL Server connection check failed");
                false
            }
        }
    }

    async fn check_connection_or_validate(&self, validate: bool) -> Result<(), DalError> {
        parse_config(&self.connection_string)?;
        if validate {
            let client = connect(&self.connection_string).await?;
            client
                .close()
                .await
                .map_err(|e| DalError::ConnectionError(format!("SQL Server close error: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_syntax_uses_go_batches() {
        let dal = SqlServerDal::new("Server=tcp:localhost,1433");
        let props = dal.specific_properties();
        assert_eq!(
            (props.block_delimiter, props.comment_start, props.comment_end),
            ("GO", "/*", "*/")
        );
        assert_eq!(dal.database_type(), DatabaseType::SqlServer);
    }
}
