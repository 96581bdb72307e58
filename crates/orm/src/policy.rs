//! Raise-or-log boundary
//!
//! Decides, per environment, which failures reach the caller and which are
//! only logged. Configuration mistakes follow `OnConfigurationError`; missing
//! rows always become `NotFound` (with the key hidden in production);
//! connection failures are always logged and become `ServiceUnavailable` in
//! production.

use std::fmt::Display;

use tessera_core::{AppConfig, Environment, Messages, OnConfigurationError};

use crate::error::{OrmError, OrmResult};

/// Environment-driven error reporting
#[derive(Debug, Clone)]
pub struct ErrorPolicy {
    environment: Environment,
    on_configuration_error: OnConfigurationError,
    messages: Messages,
}

impl ErrorPolicy {
    pub fn new(
        environment: Environment,
        on_configuration_error: OnConfigurationError,
        messages: Messages,
    ) -> Self {
        Self {
            environment,
            on_configuration_error,
            messages,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.environment,
            config.on_configuration_error,
            config.messages.clone(),
        )
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn on_configuration_error(&self) -> OnConfigurationError {
        self.on_configuration_error
    }

    /// Return `err` in raise mode; log it and return `Ok(())` in log mode.
    ///
    /// Only configuration errors can be downgraded. Anything else is
    /// returned unchanged.
    pub fn raise_or_log(&self, err: OrmError) -> OrmResult<()> {
        if !err.is_configuration() {
            return Err(err);
        }
        match self.on_configuration_error {
            OnConfigurationError::Raise => Err(err),
            OnConfigurationError::Log => {
                tracing::warn!(error = %err, "configuration error ignored, operation degraded to a no-op");
                Ok(())
            }
        }
    }

    /// Build the not-found condition for a missing row
    pub fn raise_or_not_found(&self, table: &str, key: Option<String>) -> OrmError {
        let key = if self.environment.is_production() {
            tracing::info!(table, "record not found");
            "-".to_string()
        } else {
            key.unwrap_or_else(|| "-".to_string())
        };
        OrmError::NotFound {
            table: table.to_string(),
            key,
        }
    }

    /// Turn a failed connection attempt into the error the caller sees
    pub fn connection_failure(&self, target: &str, err: impl Display) -> OrmError {
        tracing::error!(target_connector = target, error = %err, "database connection failed");
        if self.environment.is_production() {
            OrmError::ServiceUnavailable {
                retry_after: self.messages.retry_after_seconds,
                message: self.messages.service_unavailable().to_string(),
            }
        } else {
            OrmError::Connection(err.to_string())
        }
    }
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self::new(
            Environment::Development,
            OnConfigurationError::Raise,
            Messages::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::Locale;

    fn production() -> ErrorPolicy {
        ErrorPolicy::new(
            Environment::Production,
            OnConfigurationError::Log,
            Messages::new(Locale::Fr, 120),
        )
    }

    #[test]
    fn test_configuration_errors_are_raised_in_development() {
        let policy = ErrorPolicy::default();
        let result = policy.raise_or_log(OrmError::configuration("bad operator"));
        assert!(matches!(result, Err(OrmError::Configuration(_))));
    }

    #[test]
    fn test_configuration_errors_are_logged_in_production() {
        assert!(production()
            .raise_or_log(OrmError::configuration("bad operator"))
            .is_ok());
    }

    #[test]
    fn test_driver_errors_are_never_downgraded() {
        let result = production().raise_or_log(OrmError::Database("syntax".to_string()));
        assert!(matches!(result, Err(OrmError::Database(_))));
    }

    #[test]
    fn test_not_found_hides_key_in_production() {
        let dev = ErrorPolicy::default().raise_or_not_found("users", Some("42".to_string()));
        assert_eq!(
            dev,
            OrmError::NotFound {
                table: "users".to_string(),
                key: "42".to_string()
            }
        );

        let prod = production().raise_or_not_found("users", Some("42".to_string()));
        assert!(matches!(prod, OrmError::NotFound { ref key, .. } if key == "-"));
    }

    #[test]
    fn test_connection_failure_shapes() {
        let dev = ErrorPolicy::default().connection_failure("main", "connection refused");
        assert_eq!(dev, OrmError::Connection("connection refused".to_string()));

        let prod = production().connection_failure("main", "connection refused");
        match prod {
            OrmError::ServiceUnavailable { retry_after, message } => {
                assert_eq!(retry_after, 120);
                assert!(message.contains("indisponible"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
