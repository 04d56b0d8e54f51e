use async_trait::async_trait;
use tracing::warn;

use super::config::{SqliteMode, SqliteOptions};
use super::connection::{SqliteSession, open};
use super::params::{SqliteHooks, SqliteParameter};
use crate::binder;
use crate::dal::{DalSpecificProperties, DataAccessLayer};
use crate::engine::{self, Command, with_timeout};
use crate::error::DalError;
use crate::params::ParameterList;
use crate::settings::ExecutionSettings;
use crate::types::{DalValue, DatabaseType};

static SQLITE_PROPERTIES: DalSpecificProperties = DalSpecificProperties {
    block_delimiter: ";",
    comment_start: "/*",
    comment_end: "*/",
};

/// `SQLite` provider over rusqlite.
///
/// Every call opens its own connection; the command timeout doubles as the
/// busy timeout while waiting for locks held by other connections.
#[derive(Debug, Clone)]
pub struct SqliteDal {
    connection_string: String,
}

impl SqliteDal {
    #[must_use]
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
        }
    }

    /// Bind `list` into `SQLite` parameters without opening the database.
    ///
    /// # Errors
    /// Returns `DalError::TypeMapping` for an unmapped type and
    /// `DalError::ParameterError` for a `u64` above `i64::MAX`.
    pub fn bind_parameters(&self, list: &ParameterList) -> Result<Vec<SqliteParameter>, DalError> {
        binder::bind_parameters(&SqliteHooks, list)
    }

    async fn run(
        &self,
        command: Command,
        sql: &str,
        settings: &ExecutionSettings,
        params: Option<&ParameterList>,
    ) -> Result<Option<DalValue>, DalError> {
        let bound = binder::bind_optional(&SqliteHooks, params)?;
        let options = SqliteOptions::parse(&self.connection_string)?;
        let conn = open(options, true, settings.command_timeout()).await?;
        engine::run(
            SqliteSession::new(conn),
            DatabaseType::Sqlite,
            command,
            sql,
            settings,
            bound,
        )
        .await
    }
}

/// Open without creating and read the schema version.
async fn ping(connection_string: &str, settings: &ExecutionSettings) -> Result<(), DalError> {
    let options = SqliteOptions::parse(connection_string)?;
    let in_memory = options.mode == SqliteMode::Memory;
    let conn = open(options, in_memory, settings.command_timeout()).await?;
    tokio::task::spawn_blocking(move || {
        conn.query_row("PRAGMA schema_version", [], |row| row.get::<_, i64>(0))
            .map(|_| ())
            .map_err(DalError::from)
    })
    .await
    .map_err(|e| DalError::ConnectionError(format!("sqlite spawn_blocking join error: {e}")))?
}

#[async_trait]
impl DataAccessLayer for SqliteDal {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    fn specific_properties(&self) -> &DalSpecificProperties {
        &SQLITE_PROPERTIES
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
        match with_timeout(settings.command_timeout(), ping(connection_string, settings)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "SQLite connection check failed");
                false
            }
        }
    }

    async fn check_connection_or_validate(&self, validate: bool) -> Result<(), DalError> {
        let options = SqliteOptions::parse(&self.connection_string)?;
        if validate {
            // Validation must not leave an empty database file behind.
            let in_memory = options.mode == SqliteMode::Memory;
            let conn = open(options, in_memory, None).await?;
            drop(conn);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_end_with_semicolons() {
        let dal = SqliteDal::new(":memory:");
        assert_eq!(dal.specific_properties().block_delimiter, ";");
        assert_eq!(dal.database_type(), DatabaseType::Sqlite);
    }

    #[tokio::test]
    async fn validating_a_memory_database_succeeds() {
        SqliteDal::new(":memory:")
            .check_connection_or_validate(true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn memory_database_round_trip_in_one_call() {
        let dal = SqliteDal::new("Data Source=:memory:");
        let value = dal
            .execute_scalar(
                "CREATE TABLE t(x TEXT); INSERT INTO t VALUES (@v); SELECT x FROM t;",
                &ExecutionSettings::default(),
                Some(&{
                    let mut list = ParameterList::new();
                    list.add_value("v", "hello").unwrap();
                    list
                }),
            )
            .await
            .unwrap();
        assert_eq!(value, Some(DalValue::Text("hello".into())));
    }
}
