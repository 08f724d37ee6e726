//! Dialogue engine configuration

use serde::Deserialize;

use crate::domain::foundation::Locale;

use super::error::ValidationError;

/// Dialogue engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Retry budget for malformed summarizer output
    #[serde(default = "default_summarizer_attempts")]
    pub max_summarizer_attempts: u32,

    /// Locale new sessions start in, as a BCP 47 tag ("ko" or "en")
    #[serde(default = "default_locale_tag")]
    pub default_locale: String,
}

impl EngineConfig {
    /// Parses the configured locale tag.
    pub fn locale(&self) -> Result<Locale, ValidationError> {
        match self.default_locale.as_str() {
            "ko" => Ok(Locale::Korean),
            "en" => Ok(Locale::English),
            other => Err(ValidationError::UnknownLocale(other.to_string())),
        }
    }

    /// Validate engine configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_summarizer_attempts == 0 {
            return Err(ValidationError::InvalidAttemptBudget);
        }
        self.locale()?;
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_summarizer_attempts: default_summarizer_attempts(),
            default_locale: default_locale_tag(),
        }
    }
}

fn default_summarizer_attempts() -> u32 {
    3
}

fn default_locale_tag() -> String {
    "ko".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.max_summarizer_attempts, 3);
        assert_eq!(config.locale().unwrap(), Locale::Korean);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn english_locale_tag_parses() {
        let config = EngineConfig {
            default_locale: "en".to_string(),
            ..Default::default()
        };
        assert_eq!(config.locale().unwrap(), Locale::English);
    }

    #[test]
    fn unknown_locale_tag_is_rejected() {
        let config = EngineConfig {
            default_locale: "fr".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::UnknownLocale(_))
        ));
    }

    #[test]
    fn zero_attempt_budget_is_rejected() {
        let config = EngineConfig {
            max_summarizer_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidAttemptBudget)
        ));
    }
}
