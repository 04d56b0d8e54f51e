use std::sync::Arc;
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};

use crate::error::DalError;

/// Shared handle so blocking closures can own the connection while it is in use.
pub type SharedSqliteConnection = Arc<tokio::sync::Mutex<Connection>>;

/// How the database file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqliteMode {
    #[default]
    ReadWriteCreate,
    ReadWrite,
    ReadOnly,
    /// A private in-memory database; it lives only as long as one call's connection.
    Memory,
}

impl SqliteMode {
    fn parse(value: &str) -> Result<Self, DalError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "readwritecreate" => Ok(Self::ReadWriteCreate),
            "readwrite" => Ok(Self::ReadWrite),
            "readonly" => Ok(Self::ReadOnly),
            "memory" => Ok(Self::Memory),
            other => Err(DalError::ConfigError(format!("unknown SQLite mode: {other}"))),
        }
    }
}

/// Options for opening a `SQLite` database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteOptions {
    pub db_path: String,
    pub mode: SqliteMode,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            db_path,
            mode: SqliteMode::default(),
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: SqliteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Render a connection string that [`SqliteOptions::parse`] reads back.
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        let mode = match self.mode {
            SqliteMode::ReadWriteCreate => "ReadWriteCreate",
            SqliteMode::ReadWrite => "ReadWrite",
            SqliteMode::ReadOnly => "ReadOnly",
            SqliteMode::Memory => "Memory",
        };
        format!("Data Source={};Mode={mode}", self.db_path)
    }

    /// Parse a bare file path or a `Data Source=...;Mode=...` string.
    ///
    /// # Errors
    /// Returns `DalError::ConfigError` for an empty string, an unknown key or mode,
    /// or a missing data source.
    pub fn parse(connection_string: &str) -> Result<Self, DalError> {
        let trimmed = connection_string.trim();
        if trimmed.is_empty() {
            return Err(DalError::ConfigError(
                "SQLite connection string is empty".to_string(),
            ));
        }
        if !trimmed.contains('=') {
            return Ok(Self::new(trimmed.to_string()).with_memory_alias());
        }

        let mut db_path = None;
        let mut mode = SqliteMode::default();
        for pair in trimmed.split(';').filter(|p| !p.trim().is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                DalError::ConfigError(format!("malformed SQLite connection string segment: {pair}"))
            })?;
            match key.trim().to_ascii_lowercase().as_str() {
                "data source" | "datasource" | "filename" => {
                    db_path = Some(value.trim().to_string());
                }
                "mode" => mode = SqliteMode::parse(value)?,
                other => {
                    return Err(DalError::ConfigError(format!(
                        "unsupported SQLite connection string key: {other}"
                    )));
                }
            }
        }

        match db_path {
            Some(path) if !path.is_empty() => Ok(Self { db_path: path, mode }.with_memory_alias()),
            _ if mode == SqliteMode::Memory => Ok(Self {
                db_path: ":memory:".to_string(),
                mode,
            }),
            _ => Err(DalError::ConfigError(
                "SQLite connection string has no Data Source".to_string(),
            )),
        }
    }

    fn with_memory_alias(mut self) -> Self {
        if self.db_path == ":memory:" {
            self.mode = SqliteMode::Memory;
        }
        self
    }

    fn open_flags(&self, create: bool) -> OpenFlags {
        let base = OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI;
        match self.mode {
            SqliteMode::ReadOnly => base | OpenFlags::SQLITE_OPEN_READ_ONLY,
            SqliteMode::ReadWrite => base | OpenFlags::SQLITE_OPEN_READ_WRITE,
            SqliteMode::ReadWriteCreate | SqliteMode::Memory if create => {
                base | OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
            }
            SqliteMode::ReadWriteCreate | SqliteMode::Memory => {
                base | OpenFlags::SQLITE_OPEN_READ_WRITE
            }
        }
    }

    /// Open a connection; `create` allows a missing file to be created when the mode permits it.
    ///
    /// # Errors
    /// Returns `DalError::ConnectionError` if the database cannot be opened.
    pub fn open(&self, create: bool, busy_timeout: Option<Duration>) -> Result<Connection, DalError> {
        let flags = self.open_flags(create);
        let conn = if self.mode == SqliteMode::Memory {
            Connection::open_in_memory_with_flags(flags)
        } else {
            Connection::open_with_flags(&self.db_path, flags)
        }
        .map_err(|e| {
            DalError::ConnectionError(format!("Failed to open SQLite database {}: {e}", self.db_path))
        })?;

        if let Some(limit) = busy_timeout {
            conn.busy_timeout(limit)
                .map_err(|e| DalError::ConnectionError(format!("SQLite busy timeout error: {e}")))?;
        }
        Ok(conn)
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn mode(mut self, mode: SqliteMode) -> Self {
        self.opts.mode = mode;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    #[must_use]
    pub fn build(self) -> String {
        self.finish().to_connection_string()
    }
}
