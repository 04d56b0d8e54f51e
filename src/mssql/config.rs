use tiberius::Config as TiberiusConfig;
use tiberius::Client;
use tokio::net::TcpStream;
use tokio_util::compat::Compat;

use crate::error::DalError;

/// Type alias for SQL Server client
pub type MssqlClient = Client<Compat<TcpStream>>;

/// Options for building a SQL Server connection string.
#[derive(Debug, Clone)]
pub struct SqlServerOptions {
    pub server: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub port: Option<u16>,
    pub instance_name: Option<String>,
    pub trust_cert: bool,
}

impl SqlServerOptions {
    #[must_use]
    pub fn new(server: String, database: String, user: String, password: String) -> Self {
        Self {
            server,
            database,
            user,
            password,
            port: None,
            instance_name: None,
            trust_cert: false,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_instance_name(mut self, instance_name: Option<String>) -> Self {
        self.instance_name = instance_name;
        self
    }

    #[must_use]
    pub fn with_trust_cert(mut self, trust_cert: bool) -> Self {
        self.trust_cert = trust_cert;
        self
    }

    /// Render an ADO.NET style connection string.
    ///
    /// A named instance is addressed as `server\instance` and resolved through
    /// SQL Browser at connect time; otherwise the port defaults to 1433.
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        let server = match (&self.instance_name, self.port) {
            (Some(instance), _) => format!("{}\\{instance}", self.server),
            (None, port) => format!("tcp:{},{}", self.server, port.unwrap_or(1433)),
        };
        let mut parts = vec![
            format!("Server={}", quote_value(&server)),
            format!("Database={}", quote_value(&self.database)),
            format!("User Id={}", quote_value(&self.user)),
            format!("Password={}", quote_value(&self.password)),
        ];
        if self.trust_cert {
            parts.push("TrustServerCertificate=true".to_string());
        }
        parts.join(";")
    }
}

/// Fluent builder for SQL Server options.
#[derive(Debug, Clone)]
pub struct SqlServerOptionsBuilder {
    opts: SqlServerOptions,
}

impl SqlServerOptionsBuilder {
    #[must_use]
    pub fn new(server: String, database: String, user: String, password: String) -> Self {
        Self {
            opts: SqlServerOptions::new(server, database, user, password),
        }
    }

    #[must_use]
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.opts.port = port;
        self
    }

    #[must_use]
    pub fn instance_name(mut self, instance_name: Option<String>) -> Self {
        self.opts.instance_name = instance_name;
        self
    }

    #[must_use]
    pub fn trust_cert(mut self, trust_cert: bool) -> Self {
        self.opts.trust_cert = trust_cert;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqlServerOptions {
        self.opts
    }

    /// Finish and render the connection string.
    #[must_use]
    pub fn build(self) -> String {
        self.finish().to_connection_string()
    }
}

fn quote_value(value: &str) -> String {
    if value.contains(';') || value.starts_with(' ') || value.ends_with(' ') {
        format!("{{{}}}", value.replace('}', "}}"))
    } else {
        value.to_string()
    }
}

/// Parse an ADO.NET connection string into a tiberius configuration.
///
/// # Errors
/// Returns `DalError::ConfigError` if the string cannot be parsed.
pub fn parse_config(connection_string: &str) -> Result<TiberiusConfig, DalError> {
    if connection_string.trim().is_empty() {
        return Err(DalError::ConfigError(
            "SQL Server connection string is empty".to_string(),
        ));
    }
    TiberiusConfig::from_ado_string(connection_string).map_err(|e| {
        DalError::ConfigError(format!("Invalid SQL Server connection string: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_host_and_default_port() {
        let conn = SqlServerOptionsBuilder::new(
            "db.local".into(),
            "app".into(),
            "sa".into(),
            "secret".into(),
        )
        .trust_cert(true)
        .build();
        assert_eq!(
            conn,
            "Server=tcp:db.local,1433;Database=app;User Id=sa;Password=secret;TrustServerCertificate=true"
        );
        let config = parse_config(&conn).unwrap();
        assert_eq!(config.get_addr(), "db.local:1433");
    }

    #[test]
    fn named_instance_skips_port() {
        let opts = SqlServerOptions::new("host".into(), "db".into(), "u".into(), "p".into())
            .with_port(Some(1500))
            .with_instance_name(Some("SQLEXPRESS".into()));
        assert!(opts.to_connection_string().starts_with("Server=host\\SQLEXPRESS;"));
    }

    #[test]
    fn quotes_values_with_separators() {
        let opts = SqlServerOptions::new("h".into(), "db".into(), "u".into(), "a;b".into());
        assert!(opts.to_connection_string().ends_with("Password={a;b}"));
    }

    #[test]
    fn empty_string_is_a_config_error() {
        assert!(matches!(parse_config("  "), Err(DalError::ConfigError(_))));
    }
}
