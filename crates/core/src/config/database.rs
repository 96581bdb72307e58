//! Database connector configuration
//!
//! A `DatabaseConfig` maps connector names to connection settings and names
//! the connector used when a query does not ask for another one. It can be
//! built in code, parsed from YAML or read from `DB_*` environment variables.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::validation::{ConfigValidator, ConnectorValidator};
use crate::config::{ConfigError, ConfigSource};

/// Database product behind a connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriverKind {
    #[serde(rename = "mysql", alias = "mariadb")]
    MySql,
    #[serde(rename = "pgsql", alias = "postgres", alias = "postgresql")]
    Postgres,
}

impl DriverKind {
    /// Port used when the connector does not set one
    pub fn default_port(&self) -> u16 {
        match self {
            DriverKind::MySql => 3306,
            DriverKind::Postgres => 5432,
        }
    }
}

impl FromStr for DriverKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DriverKind::MySql),
            "pgsql" | "postgres" | "postgresql" => Ok(DriverKind::Postgres),
            _ => Err(ConfigError::invalid_value("driver", s, "mysql or pgsql")),
        }
    }
}

impl std::fmt::Display for DriverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverKind::MySql => write!(f, "mysql"),
            DriverKind::Postgres => write!(f, "pgsql"),
        }
    }
}

fn default_charset() -> String {
    "utf8mb4".to_string()
}

/// Settings for one named connector
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    pub driver: DriverKind,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    /// Local socket path, preferred over host/port when it exists
    #[serde(default)]
    pub socket: Option<String>,
    pub database: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_charset")]
    pub charset: String,
    /// Prepended to every derived or explicit table name
    #[serde(default)]
    pub prefix: String,
}

impl fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("socket", &self.socket)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("charset", &self.charset)
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl ConnectorConfig {
    /// Create a connector reaching `host` with default port and charset
    pub fn new(driver: DriverKind, host: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            driver,
            host: Some(host.into()),
            port: None,
            socket: None,
            database: database.into(),
            username: None,
            password: None,
            charset: default_charset(),
            prefix: String::new(),
        }
    }

    /// Set the login credentials
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set an explicit port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set a local socket path
    pub fn with_socket(mut self, socket: impl Into<String>) -> Self {
        self.socket = Some(socket.into());
        self
    }

    /// Set the table prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the character set
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Port to use when connecting over TCP
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.driver.default_port())
    }

    /// Socket path, if one is configured and present on this machine
    pub fn usable_socket(&self) -> Option<&str> {
        self.socket
            .as_deref()
            .filter(|path| !path.trim().is_empty() && Path::new(path).exists())
    }
}

/// Named connectors plus the default connector name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub default: String,
    pub connectors: HashMap<String, ConnectorConfig>,
    #[serde(skip)]
    pub source: ConfigSource,
}

impl DatabaseConfig {
    /// Create a configuration with a single connector used as default
    pub fn single(name: impl Into<String>, connector: ConnectorConfig) -> Self {
        let name = name.into();
        let mut connectors = HashMap::new();
        connectors.insert(name.clone(), connector);
        Self {
            default: name,
            connectors,
            source: ConfigSource::Programmatic,
        }
    }

    /// Add or replace a named connector
    pub fn with_connector(mut self, name: impl Into<String>, connector: ConnectorConfig) -> Self {
        self.connectors.insert(name.into(), connector);
        self
    }

    /// Look up a connector by name
    pub fn connector(&self, name: &str) -> Result<&ConnectorConfig, ConfigError> {
        self.connectors.get(name).ok_or_else(|| {
            let mut known: Vec<&str> = self.connectors.keys().map(String::as_str).collect();
            known.sort_unstable();
            ConfigError::UnknownConnector {
                name: name.to_string(),
                known: known.join(", "),
            }
        })
    }

    /// The connector named by `default`
    pub fn default_connector(&self) -> Result<&ConnectorConfig, ConfigError> {
        self.connector(&self.default)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: DatabaseConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml_str(&content)?;
        config.source = ConfigSource::File(path.display().to_string());
        Ok(config)
    }

    /// Build a single-connector configuration from `DB_*` variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let name = env::var("DB_CONNECTION").unwrap_or_else(|_| "default".to_string());
        let driver: DriverKind = env::var("DB_DRIVER")
            .map_err(|_| ConfigError::missing_required("driver", "set DB_DRIVER to mysql or pgsql"))?
            .parse()?;
        let database = env::var("DB_DATABASE")
            .map_err(|_| ConfigError::missing_required("database", "set DB_DATABASE"))?;

        let port = match env::var("DB_PORT") {
            Ok(raw) => Some(raw.parse::<u16>().map_err(|_| {
                ConfigError::invalid_value("port", raw.clone(), "valid port number (1-65535)")
            })?),
            Err(_) => None,
        };

        let connector = ConnectorConfig {
            driver,
            host: env::var("DB_HOST").ok(),
            port,
            socket: env::var("DB_SOCKET").ok(),
            database,
            username: env::var("DB_USERNAME").ok(),
            password: env::var("DB_PASSWORD").ok(),
            charset: env::var("DB_CHARSET").unwrap_or_else(|_| default_charset()),
            prefix: env::var("DB_PREFIX").unwrap_or_default(),
        };

        let mut config = Self::single(name, connector);
        config.source = ConfigSource::Env;
        config.validate()?;
        Ok(config)
    }

    /// Check the default connector exists and every connector is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connectors.is_empty() {
            return Err(ConfigError::validation_failed("no database connector configured"));
        }
        self.default_connector()?;
        for connector in self.connectors.values() {
            ConnectorValidator.validate(connector)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
default: main
connectors:
  main:
    driver: mysql
    host: 127.0.0.1
    database: shop
    username: app
    password: secret
    prefix: shop_
  reporting:
    driver: postgres
    host: reports.internal
    port: 6543
    database: analytics
"#;

    #[test]
    fn test_yaml_parsing() {
        let config = DatabaseConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(config.default, "main");

        let main = config.default_connector().unwrap();
        assert_eq!(main.driver, DriverKind::MySql);
        assert_eq!(main.charset, "utf8mb4");
        assert_eq!(main.prefix, "shop_");
        assert_eq!(main.effective_port(), 3306);

        let reporting = config.connector("reporting").unwrap();
        assert_eq!(reporting.driver, DriverKind::Postgres);
        assert_eq!(reporting.effective_port(), 6543);
    }

    #[test]
    fn test_unknown_default_connector_is_rejected() {
        let yaml = YAML.replace("default: main", "default: missing");
        let err = DatabaseConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownConnector { ref name, .. } if name == "missing"));
        assert!(err.to_string().contains("main, reporting"));
    }

    #[test]
    fn test_connector_without_address_is_rejected() {
        let mut connector = ConnectorConfig::new(DriverKind::MySql, "localhost", "shop");
        connector.host = None;
        let config = DatabaseConfig::single("main", connector);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired { ref field, .. }) if field == "host"
        ));
    }

    #[test]
    fn test_missing_socket_is_not_usable() {
        let connector = ConnectorConfig::new(DriverKind::MySql, "localhost", "shop")
            .with_socket("/definitely/not/here.sock");
        assert_eq!(connector.usable_socket(), None);
    }

    #[test]
    fn test_debug_masks_password() {
        let config = DatabaseConfig::from_yaml_str(YAML).unwrap();
        let main = format!("{:?}", config.default_connector().unwrap());
        assert!(main.contains("\"***\""));
        assert!(!main.contains("secret"));
        assert!(!format!("{:?}", config).contains("secret"));
    }

    #[test]
    fn test_driver_parsing() {
        assert_eq!("MySQL".parse::<DriverKind>().unwrap(), DriverKind::MySql);
        assert_eq!("postgresql".parse::<DriverKind>().unwrap(), DriverKind::Postgres);
        assert!("oracle".parse::<DriverKind>().is_err());
    }
}
