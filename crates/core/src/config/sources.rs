/// Where a loaded configuration came from, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    /// Values loaded from environment variables
    Env,
    /// Values loaded from a file
    File(String),
    /// Values provided programmatically
    #[default]
    Programmatic,
}

impl ConfigSource {
    /// Check if source is environment variables
    pub fn is_env(&self) -> bool {
        matches!(self, ConfigSource::Env)
    }

    /// Check if source is from file
    pub fn is_file(&self) -> bool {
        matches!(self, ConfigSource::File(_))
    }

    /// Get source description
    pub fn description(&self) -> String {
        match self {
            ConfigSource::Env => "Environment variables".to_string(),
            ConfigSource::File(path) => format!("Configuration file: {}", path),
            ConfigSource::Programmatic => "Programmatically set".to_string(),
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
