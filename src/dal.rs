use std::fmt;

use async_trait::async_trait;

use crate::error::DalError;
use crate::mapping;
use crate::params::ParameterList;
use crate::settings::ExecutionSettings;
use crate::types::{DalValue, DatabaseType, DbType, SemanticType};

/// Script-level syntax of a provider, used by callers that split multi-statement
/// scripts into batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DalSpecificProperties {
    pub block_delimiter: &'static str,
    pub comment_start: &'static str,
    pub comment_end: &'static str,
}

/// The contract every database provider implements.
///
/// Implementations hold no per-call state: each execute opens its own
/// connection (and transaction, if requested) and releases it before returning,
/// so one instance can serve concurrent calls.
#[async_trait]
pub trait DataAccessLayer: Send + Sync + fmt::Debug {
    fn database_type(&self) -> DatabaseType;

    fn specific_properties(&self) -> &DalSpecificProperties;

    /// The connection string this instance was constructed with.
    fn connection_string(&self) -> &str;

    /// Execute a statement that returns no result.
    ///
    /// # Errors
    /// Parameter binding errors are returned before any connection is opened;
    /// connection, statement, commit and rollback failures follow.
    async fn execute_non_query(
        &self,
        sql: &str,
        settings: &ExecutionSettings,
        params: Option<&ParameterList>,
    ) -> Result<(), DalError>;

    /// Execute a statement and return the first column of the first row.
    ///
    /// `Ok(None)` when the statement produced no row, `Ok(Some(DalValue::Null))`
    /// when that column is NULL.
    ///
    /// # Errors
    /// Same as [`DataAccessLayer::execute_non_query`].
    async fn execute_scalar(
        &self,
        sql: &str,
        settings: &ExecutionSettings,
        params: Option<&ParameterList>,
    ) -> Result<Option<DalValue>, DalError>;

    /// Liveness check against `connection_string`; never fails, only answers.
    async fn is_connection_valid(
        &self,
        connection_string: &str,
        settings: &ExecutionSettings,
    ) -> bool;

    /// Check the stored connection string and, when `validate` is set, open and
    /// close one connection with it.
    ///
    /// # Errors
    /// Returns `DalError::ConfigError` for a malformed connection string and
    /// `DalError::ConnectionError` when validation cannot connect.
    async fn check_connection_or_validate(&self, validate: bool) -> Result<(), DalError>;

    fn try_map_type(&self, semantic_type: &SemanticType) -> Option<DbType> {
        mapping::try_map_type(semantic_type)
    }
}
