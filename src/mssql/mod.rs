// SQL Server provider
//
// - config: connection string options and parsing
// - client: opening a tiberius client
// - params: native parameters and binding hooks
// - query: query binding and scalar extraction
// - transaction: the engine session over one client
// - dal: the DataAccessLayer implementation

pub mod client;
pub mod config;
pub mod dal;
pub mod params;
pub mod query;
pub mod transaction;

pub use config::{MssqlClient, SqlServerOptions, SqlServerOptionsBuilder};
pub use dal::SqlServerDal;
pub use params::{MssqlParameter, SqlServerHooks};
