use thiserror::Error;

#[derive(Debug, Error)]
pub enum DalError {
    #[cfg(feature = "mssql")]
    #[error(transparent)]
    MssqlError(#[from] tiberius::error::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Duplicate parameter: {name}")]
    DuplicateParameter { name: String },

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("No database type mapping for parameter {name} of type {semantic_type}")]
    TypeMapping { name: String, semantic_type: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Transaction error: {0}")]
    TransactionError(String),

    #[error("Rollback failed ({rollback}) after: {original}")]
    RollbackFailed {
        original: Box<DalError>,
        rollback: Box<DalError>,
    },

    #[error("Command timed out after {seconds}s")]
    Timeout { seconds: u32 },

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),

    #[error("Other database error: {0}")]
    Other(String),
}

impl DalError {
    /// The failure that caused the call to abort.
    ///
    /// For `RollbackFailed` this is the statement or commit error that triggered the
    /// rollback; every other variant returns itself.
    #[must_use]
    pub fn original(&self) -> &DalError {
        match self {
            DalError::RollbackFailed { original, .. } => original,
            other => other,
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.original(), DalError::Timeout { .. })
    }
}
