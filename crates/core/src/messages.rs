//! User-facing texts shown when the database is unreachable in production.

use std::str::FromStr;

use crate::config::ConfigError;

/// Supported message languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Fr,
}

impl FromStr for Locale {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().split(['-', '_']).next().unwrap_or_default() {
            "en" => Ok(Locale::En),
            "fr" => Ok(Locale::Fr),
            _ => Err(ConfigError::invalid_value("locale", s, "en or fr")),
        }
    }
}

/// Localized texts and retry hint for degraded responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
    pub locale: Locale,
    pub retry_after_seconds: u64,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            locale: Locale::En,
            retry_after_seconds: 60,
        }
    }
}

impl Messages {
    pub fn new(locale: Locale, retry_after_seconds: u64) -> Self {
        Self {
            locale,
            retry_after_seconds,
        }
    }

    /// Text for a service-unavailable response
    pub fn service_unavailable(&self) -> &'static str {
        match self.locale {
            Locale::En => "The service is temporarily unavailable. Please try again in a few moments.",
            Locale::Fr => "Le service est momentanément indisponible. Merci de réessayer dans quelques instants.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_parsing_ignores_region() {
        assert_eq!("fr_FR".parse::<Locale>().unwrap(), Locale::Fr);
        assert_eq!("en-GB".parse::<Locale>().unwrap(), Locale::En);
        assert!("de".parse::<Locale>().is_err());
    }

    #[test]
    fn test_service_unavailable_is_localized() {
        let fr = Messages::new(Locale::Fr, 30);
        assert!(fr.service_unavailable().contains("indisponible"));
        assert_ne!(fr.service_unavailable(), Messages::default().service_unavailable());
    }
}
