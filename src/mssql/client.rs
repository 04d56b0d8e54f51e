use tiberius::{Client, Config, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncWriteCompatExt;
use tracing::debug;

use super::config::{MssqlClient, parse_config};
use crate::error::DalError;

async fn open_tcp(config: &Config) -> Result<TcpStream, DalError> {
    // Resolves `server\instance` through SQL Browser; plain hosts connect directly.
    let tcp = TcpStream::connect_named(config).await.map_err(|e| {
        DalError::ConnectionError(format!("SQL Server TCP connection error: {e}"))
    })?;
    tcp.set_nodelay(true)
        .map_err(|e| DalError::ConnectionError(format!("SQL Server TCP setup error: {e}")))?;
    Ok(tcp)
}

/// Open one client connection from an ADO.NET connection string.
///
/// # Errors
/// Returns `DalError::ConfigError` for an unparseable string and
/// `DalError::ConnectionError` when the server cannot be reached or refuses the login.
pub async fn connect(connection_string: &str) -> Result<MssqlClient, DalError> {
    let mut config = parse_config(connection_string)?;

    let tcp = open_tcp(&config).await?;
    match Client::connect(config.clone(), tcp.compat_write()).await {
        Ok(client) => Ok(client),
        Err(tiberius::error::Error::Routing { host, port }) => {
            debug!(%host, port, "SQL Server redirected the connection");
            config.host(&host);
            config.port(port);
            let tcp = open_tcp(&config).await?;
            Client::connect(config, tcp.compat_write()).await.map_err(|e| {
                DalError::ConnectionError(format!("SQL Server connection error: {e}"))
            })
        }
        Err(e) => Err(DalError::ConnectionError(format!(
            "SQL Server connection error: {e}"
        ))),
    }
}
