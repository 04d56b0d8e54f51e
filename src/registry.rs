use serde::{Deserialize, Serialize};

use crate::dal::DataAccessLayer;
use crate::error::DalError;
use crate::settings::ExecutionSettings;
use crate::types::DatabaseType;

/// Construct the provider for `database_type`.
///
/// # Errors
/// Returns `DalError::Unimplemented` when that provider was compiled out of this build.
pub fn create_dal(
    database_type: DatabaseType,
    connection_string: &str,
) -> Result<Box<dyn DataAccessLayer>, DalError> {
    match database_type {
        #[cfg(feature = "mssql")]
        DatabaseType::SqlServer => Ok(Box::new(crate::mssql::SqlServerDal::new(
            connection_string,
        ))),
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite => Ok(Box::new(crate::sqlite::SqliteDal::new(connection_string))),
        #[allow(unreachable_patterns)]
        other => {
            let _ = connection_string;
            Err(DalError::Unimplemented(format!(
                "{other} support is not enabled in this build"
            )))
        }
    }
}

/// Construct a provider from its tag, e.g. `"Sqlite"`.
///
/// # Errors
/// Returns `DalError::ConfigError` for an unknown tag, otherwise as [`create_dal`].
pub fn create_dal_by_tag(
    tag: &str,
    connection_string: &str,
) -> Result<Box<dyn DataAccessLayer>, DalError> {
    create_dal(tag.parse()?, connection_string)
}

/// A provider selection together with the settings callers should use with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DalConfig {
    pub database_type: DatabaseType,
    pub connection_string: String,
    #[serde(default)]
    pub settings: ExecutionSettings,
}

impl DalConfig {
    #[must_use]
    pub fn new(database_type: DatabaseType, connection_string: impl Into<String>) -> Self {
        Self {
            database_type,
            connection_string: connection_string.into(),
            settings: ExecutionSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ExecutionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Parse a JSON document such as
    /// `{"database_type": "Sqlite", "connection_string": "app.db"}`.
    ///
    /// # Errors
    /// Returns `DalError::ConfigError` if the document does not describe a config.
    pub fn from_json(json: &str) -> Result<Self, DalError> {
        serde_json::from_str(json)
            .map_err(|e| DalError::ConfigError(format!("invalid DAL configuration: {e}")))
    }

    /// Build the configured provider.
    ///
    /// # Errors
    /// Same as [`create_dal`].
    pub fn build(&self) -> Result<Box<dyn DataAccessLayer>, DalError> {
        create_dal(self.database_type, &self.connection_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_config_fills_default_settings() {
        let config =
            DalConfig::from_json(r#"{"database_type": "Sqlite", "connection_string": "a.db"}"#)
                .unwrap();
        assert_eq!(config, DalConfig::new(DatabaseType::Sqlite, "a.db"));
    }

    #[test]
    fn unknown_provider_tag_is_a_config_error() {
        assert!(matches!(
            create_dal_by_tag("Oracle", "x"),
            Err(DalError::ConfigError(_))
        ));
        assert!(DalConfig::from_json(r#"{"database_type": "Oracle"}"#).is_err());
    }

    #[cfg(all(feature = "mssql", feature = "sqlite"))]
    #[test]
    fn builds_each_provider_by_tag() {
        let dal = create_dal_by_tag("sqlserver", "Server=tcp:localhost,1433").unwrap();
        assert_eq!(dal.database_type(), DatabaseType::SqlServer);
        let dal = create_dal_by_tag("Sqlite", "app.db").unwrap();
        assert_eq!(dal.database_type(), DatabaseType::Sqlite);
        assert_eq!(dal.connection_string(), "app.db");
    }
}
