//! # tessera-core: shared configuration for tessera
//!
//! Environment detection, database connector configuration and the
//! localized messages used when the persistence layer degrades.

pub mod config;
pub mod messages;

pub use config::{
    AppConfig, ConfigError, ConfigSource, ConnectorConfig, DatabaseConfig, DriverKind, Environment,
    OnConfigurationError,
};
pub use messages::{Locale, Messages};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
