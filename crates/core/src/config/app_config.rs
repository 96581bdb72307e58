use std::env;
use std::str::FromStr;

use crate::config::{ConfigError, DatabaseConfig};
use crate::messages::{Locale, Messages};

/// Environment enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue {
                field: "environment".to_string(),
                value: s.to_string(),
                expected: "development, testing, or production".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env_str = match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        };
        write!(f, "{}", env_str)
    }
}

impl Environment {
    /// Check if environment is production
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Get debug mode status based on environment
    pub fn debug_mode(&self) -> bool {
        !self.is_production()
    }
}

/// What happens when a query is built with a programmer mistake
/// (disallowed operator, wrong join arity, empty IN set, unknown connector)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnConfigurationError {
    /// Fail the operation with the error
    Raise,
    /// Log the error and turn the operation into a no-op
    Log,
}

impl OnConfigurationError {
    /// Default behaviour for an environment
    pub fn for_environment(environment: Environment) -> Self {
        if environment.is_production() {
            OnConfigurationError::Log
        } else {
            OnConfigurationError::Raise
        }
    }
}

impl FromStr for OnConfigurationError {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raise" => Ok(OnConfigurationError::Raise),
            "log" => Ok(OnConfigurationError::Log),
            _ => Err(ConfigError::invalid_value("on_configuration_error", s, "raise or log")),
        }
    }
}

/// Everything the persistence layer reads from the application
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub on_configuration_error: OnConfigurationError,
    pub messages: Messages,
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Create a configuration with environment-derived defaults
    pub fn new(environment: Environment, database: DatabaseConfig) -> Self {
        Self {
            environment,
            on_configuration_error: OnConfigurationError::for_environment(environment),
            messages: Messages::default(),
            database,
        }
    }

    /// Development configuration over `database`
    pub fn development(database: DatabaseConfig) -> Self {
        Self::new(Environment::Development, database)
    }

    /// Production configuration over `database`
    pub fn production(database: DatabaseConfig) -> Self {
        Self::new(Environment::Production, database)
    }

    /// Override the configuration error behaviour
    pub fn with_configuration_errors(mut self, mode: OnConfigurationError) -> Self {
        self.on_configuration_error = mode;
        self
    }

    /// Override the user-facing messages
    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    /// Load from `ENVIRONMENT`, `CONFIG_ERRORS`, `APP_LOCALE`, `RETRY_AFTER` and `DB_*`
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("ENVIRONMENT") {
            Ok(raw) => raw.parse()?,
            Err(_) => Environment::Development,
        };

        let mut config = Self::new(environment, DatabaseConfig::from_env()?);

        if let Ok(raw) = env::var("CONFIG_ERRORS") {
            config.on_configuration_error = raw.parse()?;
        }
        if let Ok(raw) = env::var("APP_LOCALE") {
            config.messages.locale = raw.parse::<Locale>()?;
        }
        if let Ok(raw) = env::var("RETRY_AFTER") {
            config.messages.retry_after_seconds = raw.parse().map_err(|_| {
                ConfigError::invalid_value("retry_after", raw.clone(), "number of seconds")
            })?;
        }

        Ok(config)
    }
}
