//! Provider-neutral data access: typed named parameters, per-provider binding
//! and transactional execution of single statements against SQL Server
//! (`mssql` feature) and `SQLite` (`sqlite` feature).

pub mod binder;
pub mod blocking;
pub mod dal;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod params;
pub mod prelude;
pub mod registry;
pub mod settings;
pub mod translation;
pub mod types;

#[cfg(feature = "mssql")]
pub mod mssql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use blocking::BlockingDal;
pub use dal::{DalSpecificProperties, DataAccessLayer};
pub use error::DalError;
pub use params::{DalParameter, ParameterList};
pub use registry::{DalConfig, create_dal, create_dal_by_tag};
pub use settings::ExecutionSettings;
pub use types::{DalValue, DatabaseType, DbType, Decimal, SemanticType};

#[cfg(feature = "mssql")]
pub use mssql::SqlServerDal;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDal;
