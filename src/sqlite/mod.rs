// SQLite provider
//
// - config: connection string parsing and open flags
// - connection: the engine session, blocking offload and timeout watchdog
// - params: native parameters and binding hooks
// - query: statement-by-statement execution
// - dal: the DataAccessLayer implementation

pub mod config;
pub mod connection;
pub mod dal;
pub mod params;
pub mod query;

pub use config::{SharedSqliteConnection, SqliteMode, SqliteOptions, SqliteOptionsBuilder};
pub use dal::SqliteDal;
pub use params::{SqliteHooks, SqliteParameter};
