//! Error types for the ORM system
//!
//! Every fallible operation in the crate returns `OrmResult<T>`. Which of
//! these errors reach the caller and which are only logged is decided by the
//! [`ErrorPolicy`](crate::policy::ErrorPolicy).

use tessera_core::ConfigError;

/// Result type alias for ORM operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for ORM operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrmError {
    /// Programmer mistake while building a query or choosing a connector
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single-row lookup that must succeed found nothing
    #[error("Record not found in table '{table}' (key: {key})")]
    NotFound { table: String, key: String },

    /// Connection could not be established, raw driver message
    #[error("Connection error: {0}")]
    Connection(String),

    /// Connection could not be established, user-facing form
    #[error("{message} (retry after {retry_after}s)")]
    ServiceUnavailable { retry_after: u64, message: String },

    /// Driver error on an established connection
    #[error("Database error: {0}")]
    Database(String),

    /// Rendered statement and bind list disagree
    #[error("Bind mismatch: {placeholders} placeholders but {binds} bound values")]
    BindMismatch { placeholders: usize, binds: usize },

    /// A row could not be turned into a model
    #[error("Hydration error: {0}")]
    Hydration(String),

    /// Transaction control failed
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl OrmError {
    pub fn configuration(message: impl Into<String>) -> Self {
        OrmError::Configuration(message.into())
    }

    pub fn hydration(message: impl Into<String>) -> Self {
        OrmError::Hydration(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, OrmError::Configuration(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, OrmError::NotFound { .. })
    }

    /// HTTP status an outer layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            OrmError::NotFound { .. } => 404,
            OrmError::ServiceUnavailable { .. } => 503,
            _ => 500,
        }
    }

    /// Seconds a client should wait before retrying, when known
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            OrmError::ServiceUnavailable { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for OrmError {
    fn from(err: sqlx::Error) -> Self {
        OrmError::Database(err.to_string())
    }
}

impl From<ConfigError> for OrmError {
    fn from(err: ConfigError) -> Self {
        OrmError::Configuration(err.to_string())
    }
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        OrmError::Hydration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let not_found = OrmError::NotFound {
            table: "users".to_string(),
            key: "7".to_string(),
        };
        assert_eq!(not_found.status_code(), 404);
        assert!(not_found.is_not_found());

        let unavailable = OrmError::ServiceUnavailable {
            retry_after: 30,
            message: "down".to_string(),
        };
        assert_eq!(unavailable.status_code(), 503);
        assert_eq!(unavailable.retry_after(), Some(30));

        assert_eq!(OrmError::configuration("bad").status_code(), 500);
    }

    #[test]
    fn test_config_error_conversion() {
        let err: OrmError = ConfigError::validation_failed("no connector").into();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("no connector"));
    }
}
