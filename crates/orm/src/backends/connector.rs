//! Connector abstraction
//!
//! A connector turns one `ConnectorConfig` into an open `Connection`. The
//! trait's provided methods build the descriptor (address, credentials and
//! options) and report failures through the `ErrorPolicy`; each database
//! product only supplies its dialect options and the driver call.

use std::fmt;

use async_trait::async_trait;

use tessera_core::{ConnectorConfig, DriverKind};

use super::core::{Connection, SqlDialect};
use super::mysql::MySqlConnector;
use super::postgres::PostgresConnector;
use crate::error::OrmResult;
use crate::policy::ErrorPolicy;

/// Where the server is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// Local socket path
    Socket(String),
    Tcp { host: String, port: u16 },
}

/// Driver options applied when opening a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Client character set sent during the handshake
    pub charset: Option<String>,
    /// Allow more than one statement per execution
    pub multi_statements: bool,
    /// Prepared statements kept per connection
    pub statement_cache_capacity: usize,
}

impl ConnectionOptions {
    /// Options shared by every connector
    pub fn uniform() -> Self {
        Self {
            charset: None,
            multi_statements: true,
            statement_cache_capacity: 100,
        }
    }
}

/// Everything needed to open one connection
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub driver: DriverKind,
    pub address: Address,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub options: ConnectionOptions,
}

impl ConnectionDescriptor {
    /// DSN-style rendering, without credentials
    pub fn dsn(&self) -> String {
        let location = match &self.address {
            Address::Socket(path) => match self.driver {
                DriverKind::MySql => format!("unix_socket={}", path),
                DriverKind::Postgres => format!("host={}", path),
            },
            Address::Tcp { host, port } => format!("host={};port={}", host, port),
        };
        let mut dsn = format!("{}:{};dbname={}", self.driver, location, self.database);
        if let Some(charset) = &self.options.charset {
            dsn.push_str(";charset=");
            dsn.push_str(charset);
        }
        dsn
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("dsn", &self.dsn())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("options", &self.options)
            .finish()
    }
}

/// Opens connections for one database product
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connector name used in logs
    fn name(&self) -> &str;

    fn config(&self) -> &ConnectorConfig;

    fn dialect(&self) -> SqlDialect;

    /// Adjust the uniform options for this product
    fn dialect_options(&self, options: ConnectionOptions) -> ConnectionOptions {
        options
    }

    /// Open a driver connection for `descriptor`
    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<Box<dyn Connection>, sqlx::Error>;

    /// Build the descriptor, preferring a usable local socket over host/port
    fn descriptor(&self) -> ConnectionDescriptor {
        let config = self.config();
        let address = match config.usable_socket() {
            Some(path) => Address::Socket(path.to_string()),
            None => Address::Tcp {
                host: config.host.clone().unwrap_or_else(|| "localhost".to_string()),
                port: config.effective_port(),
            },
        };

        ConnectionDescriptor {
            driver: config.driver,
            address,
            database: config.database.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            options: self.dialect_options(ConnectionOptions::uniform()),
        }
    }

    /// Open a connection, routing failures through the policy
    async fn connect(&self, policy: &ErrorPolicy) -> OrmResult<Box<dyn Connection>> {
        let descriptor = self.descriptor();
        tracing::debug!(connector = self.name(), dsn = %descriptor.dsn(), "opening database connection");

        match self.open(&descriptor).await {
            Ok(connection) => {
                tracing::info!(connector = self.name(), dialect = %self.dialect(), "database connection established");
                Ok(connection)
            }
            Err(err) => Err(policy.connection_failure(self.name(), err)),
        }
    }
}

/// Pick the connector implementation for a configuration
pub fn connector_for(name: impl Into<String>, config: ConnectorConfig) -> Box<dyn Connector> {
    match config.driver {
        DriverKind::MySql => Box::new(MySqlConnector::new(name, config)),
        DriverKind::Postgres => Box::new(PostgresConnector::new(name, config)),
    }
}

/// Opens a connection for resolved connector settings
///
/// `Database` asks its factory whenever it needs a connection it does not
/// already hold.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn open(&self, name: &str, config: ConnectorConfig, policy: &ErrorPolicy) -> OrmResult<Box<dyn Connection>>;
}

/// Factory backed by the sqlx drivers
#[derive(Debug, Clone, Copy, Default)]
pub struct DriverFactory;

#[async_trait]
impl ConnectionFactory for DriverFactory {
    async fn open(&self, name: &str, config: ConnectorConfig, policy: &ErrorPolicy) -> OrmResult<Box<dyn Connection>> {
        connector_for(name, config).connect(policy).await
    }
}
