//! Connection provider
//!
//! `Database` is the explicit replacement for a process-wide connection
//! slot. It is cheap to clone and every clone shares the same cached
//! connection for the default target. Queries pointed at another connector
//! or at explicit credentials always get a fresh, uncached connection from
//! the provider's `ConnectionFactory`.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use tessera_core::{AppConfig, ConnectorConfig};

use crate::backends::{Connection, ConnectionFactory, DriverFactory};
use crate::error::OrmResult;
use crate::policy::ErrorPolicy;

/// A connection shared between queries
pub type SharedConnection = Arc<Mutex<Box<dyn Connection>>>;

/// Which database a query runs against
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Target {
    /// The provider's own connection
    #[default]
    Default,
    /// A named connector from the configuration
    Connector(String),
    /// Explicit connection settings
    Credentials(ConnectorConfig),
}

impl Target {
    pub fn connector(name: impl Into<String>) -> Self {
        Target::Connector(name.into())
    }

    pub fn credentials(config: ConnectorConfig) -> Self {
        Target::Credentials(config)
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Target::Default)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Default => write!(f, "default"),
            Target::Connector(name) => write!(f, "connector '{}'", name),
            Target::Credentials(config) => write!(
                f,
                "credentials {}@{}",
                config.username.as_deref().unwrap_or(""),
                config.database
            ),
        }
    }
}

struct DatabaseInner {
    config: AppConfig,
    policy: ErrorPolicy,
    /// Target served by `slot`
    home: Target,
    slot: Mutex<Option<SharedConnection>>,
    factory: Arc<dyn ConnectionFactory>,
}

/// Connection provider handed to queries and models
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Create a provider; the default connection opens on first use
    pub fn new(config: AppConfig) -> Self {
        Self::build(config, Target::Default, None, Arc::new(DriverFactory))
    }

    /// Create a provider around an already open connection
    pub fn with_connection(config: AppConfig, connection: Box<dyn Connection>) -> Self {
        Self::build(
            config,
            Target::Default,
            Some(Arc::new(Mutex::new(connection))),
            Arc::new(DriverFactory),
        )
    }

    /// Create a provider that opens every connection through `factory`
    pub fn with_factory(config: AppConfig, factory: impl ConnectionFactory + 'static) -> Self {
        Self::build(config, Target::Default, None, Arc::new(factory))
    }

    fn build(
        config: AppConfig,
        home: Target,
        connection: Option<SharedConnection>,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Self {
        let policy = ErrorPolicy::from_config(&config);
        Self {
            inner: Arc::new(DatabaseInner {
                config,
                policy,
                home,
                slot: Mutex::new(connection),
                factory,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn policy(&self) -> &ErrorPolicy {
        &self.inner.policy
    }

    /// Connector name and settings behind a target
    pub fn resolve(&self, target: &Target) -> OrmResult<(String, ConnectorConfig)> {
        let database = &self.inner.config.database;
        match target {
            Target::Default => match &self.inner.home {
                Target::Default => Ok((database.default.clone(), database.default_connector()?.clone())),
                home => self.resolve(home),
            },
            Target::Connector(name) => Ok((name.clone(), database.connector(name)?.clone())),
            Target::Credentials(config) => Ok(("credentials".to_string(), config.clone())),
        }
    }

    /// Table prefix configured for a target
    pub fn prefix(&self, target: &Target) -> OrmResult<String> {
        Ok(self.resolve(target)?.1.prefix)
    }

    /// Connection for a target
    ///
    /// The default target reuses the cached connection, opening it on first
    /// use. Every other target gets a new connection.
    pub async fn connection(&self, target: &Target) -> OrmResult<SharedConnection> {
        if !target.is_default() {
            return self.open(target).await;
        }

        let mut slot = self.inner.slot.lock().await;
        if let Some(connection) = slot.as_ref() {
            return Ok(Arc::clone(connection));
        }

        let connection = self.open(&Target::Default).await?;
        *slot = Some(Arc::clone(&connection));
        Ok(connection)
    }

    async fn open(&self, target: &Target) -> OrmResult<SharedConnection> {
        let (name, config) = self.resolve(target)?;
        tracing::debug!(target_connector = %target, "resolving connection");
        let connection = self.inner.factory.open(&name, config, &self.inner.policy).await?;
        Ok(Arc::new(Mutex::new(connection)))
    }

    /// A provider whose default target is `target`, on its own connection
    ///
    /// Use this to run several statements, such as a transaction, through
    /// one non-default connection.
    pub async fn scoped(&self, target: Target) -> OrmResult<Database> {
        let connection = self.connection(&target).await?;
        let home = match target {
            Target::Default => self.inner.home.clone(),
            other => other,
        };
        Ok(Self::build(
            self.inner.config.clone(),
            home,
            Some(connection),
            Arc::clone(&self.inner.factory),
        ))
    }

    /// Whether the default connection has been opened
    pub async fn is_connected(&self) -> bool {
        self.inner.slot.lock().await.is_some()
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("environment", &self.inner.config.environment)
            .field("default", &self.inner.config.database.default)
            .field("home", &self.inner.home)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrmError;
    use crate::testing::{RecordingConnection, RecordingFactory};
    use tessera_core::{DatabaseConfig, DriverKind};

    fn config() -> AppConfig {
        let main = ConnectorConfig::new(DriverKind::MySql, "localhost", "shop").with_prefix("shop_");
        let reporting = ConnectorConfig::new(DriverKind::Postgres, "reports", "analytics");
        AppConfig::development(DatabaseConfig::single("main", main).with_connector("reporting", reporting))
    }

    #[test]
    fn test_resolve_targets() {
        let db = Database::new(config());
        assert_eq!(db.resolve(&Target::Default).unwrap().0, "main");
        assert_eq!(db.prefix(&Target::Default).unwrap(), "shop_");
        assert_eq!(db.prefix(&Target::connector("reporting")).unwrap(), "");
        assert!(matches!(
            db.resolve(&Target::connector("missing")),
            Err(OrmError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_default_connection_is_cached() {
        let db = Database::with_connection(config(), Box::new(RecordingConnection::mysql()));
        let first = db.connection(&Target::Default).await.unwrap();
        let second = db.clone().connection(&Target::Default).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_unknown_connector_fails_before_connecting() {
        let db = Database::new(config());
        let result = db.connection(&Target::connector("missing")).await;
        assert!(matches!(result, Err(OrmError::Configuration(_))));
        assert!(!db.is_connected().await);
    }

    #[tokio::test]
    async fn test_default_connection_opens_once() {
        let factory = RecordingFactory::new();
        let db = Database::with_factory(config(), factory.clone());

        let first = db.connection(&Target::Default).await.unwrap();
        let second = db.connection(&Target::Default).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.opened(), vec!["main"]);
    }

    #[tokio::test]
    async fn test_other_targets_get_fresh_connections() {
        let factory = RecordingFactory::new();
        let db = Database::with_factory(config(), factory.clone());
        let credentials = Target::credentials(
            ConnectorConfig::new(DriverKind::MySql, "replica", "shop").with_credentials("ro", "hunter2"),
        );

        let first = db.connection(&Target::connector("reporting")).await.unwrap();
        let second = db.connection(&Target::connector("reporting")).await.unwrap();
        let third = db.connection(&credentials).await.unwrap();
        let fourth = db.connection(&credentials).await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&third, &fourth));
        assert_eq!(factory.opened(), vec!["reporting", "reporting", "credentials", "credentials"]);
        assert!(!db.is_connected().await);
    }

    #[tokio::test]
    async fn test_scoped_provider_keeps_its_connection() {
        let factory = RecordingFactory::new();
        let db = Database::with_factory(config(), factory.clone());
        let credentials = Target::credentials(
            ConnectorConfig::new(DriverKind::Postgres, "replica", "shop").with_credentials("ro", "hunter2"),
        );

        let scoped = db.scoped(credentials).await.unwrap();
        let first = scoped.connection(&Target::Default).await.unwrap();
        let second = scoped.connection(&Target::Default).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.opened(), vec!["credentials"]);
        let debug = format!("{:?}", scoped);
        assert!(debug.contains("replica"));
        assert!(!debug.contains("hunter2"));
    }
}
