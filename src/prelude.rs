//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::binder::{NativeParameter, ParameterHooks, bind_parameters};
pub use crate::blocking::BlockingDal;
pub use crate::dal::{DalSpecificProperties, DataAccessLayer};
pub use crate::error::DalError;
pub use crate::mapping::try_map_type;
pub use crate::params::{DalParameter, ParameterList};
pub use crate::registry::{DalConfig, create_dal, create_dal_by_tag};
pub use crate::settings::ExecutionSettings;
pub use crate::types::{DalValue, DatabaseType, DbType, Decimal, SemanticType};

#[cfg(feature = "mssql")]
pub use crate::mssql::{MssqlParameter, SqlServerDal, SqlServerOptions, SqlServerOptionsBuilder};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteDal, SqliteMode, SqliteOptions, SqliteOptionsBuilder, SqliteParameter};
