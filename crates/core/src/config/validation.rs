use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired { field: String, hint: String },

    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Unknown connector '{name}'. Configured connectors: {known}")]
    UnknownConnector { name: String, known: String },

    #[error("Configuration validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    /// Create a missing required field error
    pub fn missing_required(field: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingRequired {
            field: field.into(),
            hint: hint.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Create a validation failed error
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

/// Trait for validating configuration values
pub trait ConfigValidator<T> {
    /// Validate a configuration value
    fn validate(&self, value: &T) -> Result<(), ConfigError>;
}

/// Rejects connector entries that cannot produce a connection address.
pub struct ConnectorValidator;

impl ConfigValidator<crate::config::ConnectorConfig> for ConnectorValidator {
    fn validate(&self, value: &crate::config::ConnectorConfig) -> Result<(), ConfigError> {
        if value.database.trim().is_empty() {
            return Err(ConfigError::missing_required(
                "database",
                "every connector needs a database name",
            ));
        }

        let has_host = value.host.as_deref().is_some_and(|h| !h.trim().is_empty());
        let has_socket = value.socket.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !has_host && !has_socket {
            return Err(ConfigError::missing_required(
                "host",
                "set either `host` or `socket` for the connector",
            ));
        }

        if value.port == Some(0) {
            return Err(ConfigError::invalid_value("port", "0", "port between 1 and 65535"));
        }

        Ok(())
    }
}
