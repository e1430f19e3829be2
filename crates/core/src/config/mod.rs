//! Configuration management
//!
//! [`FolioConfig`] holds everything the client needs at start-up. Every
//! section has defaults, so a config file only has to name what it changes.
//! Loading from the environment or from files lives in [`loader`].

pub mod loader;

use std::collections::BTreeMap;
use std::time::Duration;

use folio_common::compliance::ConsentKeys;
use folio_common::storage::CookieOptions;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{FolioError, Result};

// Re-export commonly used items
pub use loader::{load, load_from_env, load_from_file, probe_config_paths};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    /// Title used when a page has no translated `og:title`
    pub site_title: String,
    pub endpoints: EndpointsConfig,
    pub captcha: CaptchaConfig,
    pub cookies: CookieConfig,
    /// Supported languages keyed by code
    pub languages: BTreeMap<String, LanguageInfo>,
    pub default_language: String,
    /// `light` or `dark`
    pub default_theme: String,
    pub ui: UiConfig,
    pub timing: TimingConfig,
    pub logging: LoggingConfig,
}

/// Remote resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Base URL the data feed paths are resolved against
    pub base_url: String,
    /// Absolute URL the contact form posts to
    pub contact_form: String,
    pub translations: String,
    pub projects: String,
    pub skills: String,
    pub schema: String,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

/// reCAPTCHA settings; no site key disables the captcha step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptchaConfig {
    pub site_key: Option<String>,
    pub action: String,
}

/// Longest cookie lifetime accepted by [`FolioConfig::validate`]
pub const MAX_COOKIE_EXPIRATION_DAYS: u32 = 3650;

/// Durable-tier cookie settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    pub expiration_days: u32,
    pub decision_key: String,
    pub preferences_key: String,
    pub analytics_key: String,
}

/// Display name and Open Graph locale of a language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub name: String,
    pub og_locale: String,
}

/// Layout constants, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub header_height: f64,
    pub scroll_offset: f64,
    pub back_to_top_threshold: f64,
}

/// Debounce and throttle intervals, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub scroll_throttle_ms: u64,
    pub resize_debounce_ms: u64,
    pub input_debounce_ms: u64,
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            site_title: "Portfolio".to_string(),
            endpoints: EndpointsConfig::default(),
            captcha: CaptchaConfig::default(),
            cookies: CookieConfig::default(),
            languages: default_languages(),
            default_language: "de".to_string(),
            default_theme: "light".to_string(),
            ui: UiConfig::default(),
            timing: TimingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
            contact_form: "https://formspree.io/f/xyzdlrvd".to_string(),
            translations: "js/data/translations.json".to_string(),
            projects: "js/data/projects.json".to_string(),
            skills: "js/data/skills.json".to_string(),
            schema: "js/data/schema.json".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self { site_key: None, action: "submit".to_string() }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        let keys = ConsentKeys::default();
        Self {
            expiration_days: folio_common::storage::DEFAULT_EXPIRATION_DAYS,
            decision_key: keys.decision,
            preferences_key: keys.preferences,
            analytics_key: keys.analytics,
        }
    }
}

impl CookieConfig {
    /// Durable key names for the preference store
    pub fn consent_keys(&self) -> ConsentKeys {
        ConsentKeys {
            decision: self.decision_key.clone(),
            preferences: self.preferences_key.clone(),
            analytics: self.analytics_key.clone(),
        }
    }

    /// Cookie attributes for the durable tier
    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions { expiration_days: self.expiration_days, ..CookieOptions::default() }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { header_height: 80.0, scroll_offset: 20.0, back_to_top_threshold: 300.0 }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self { scroll_throttle_ms: 10, resize_debounce_ms: 250, input_debounce_ms: 300 }
    }
}

impl TimingConfig {
    pub fn scroll_throttle(&self) -> Duration {
        Duration::from_millis(self.scroll_throttle_ms)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    pub fn input_debounce(&self) -> Duration {
        Duration::from_millis(self.input_debounce_ms)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

fn default_languages() -> BTreeMap<String, LanguageInfo> {
    [("de", "Deutsch", "de_DE"), ("en", "English", "en_US"), ("ru", "Русский", "ru_RU")]
        .into_iter()
        .map(|(code, name, og_locale)| {
            (code.to_string(), LanguageInfo { name: name.to_string(), og_locale: og_locale.to_string() })
        })
        .collect()
}

impl FolioConfig {
    /// Check cross-field constraints
    ///
    /// # Errors
    /// Returns `FolioError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.languages.is_empty() {
            return Err(FolioError::Config("languages: at least one language is required".into()));
        }
        if !self.languages.contains_key(&self.default_language) {
            return Err(FolioError::Config(format!(
                "default_language: '{}' is not in the language table",
                self.default_language
            )));
        }
        if !matches!(self.default_theme.as_str(), "light" | "dark") {
            return Err(FolioError::Config(format!(
                "default_theme: expected 'light' or 'dark', got '{}'",
                self.default_theme
            )));
        }
        for (name, value) in [
            ("timing.scroll_throttle_ms", self.timing.scroll_throttle_ms),
            ("timing.resize_debounce_ms", self.timing.resize_debounce_ms),
            ("timing.input_debounce_ms", self.timing.input_debounce_ms),
            ("endpoints.timeout_seconds", self.endpoints.timeout_seconds),
            ("cookies.expiration_days", u64::from(self.cookies.expiration_days)),
        ] {
            if value == 0 {
                return Err(FolioError::Config(format!("{name}: must be greater than zero")));
            }
        }
        if self.cookies.expiration_days > MAX_COOKIE_EXPIRATION_DAYS {
            return Err(FolioError::Config(format!(
                "cookies.expiration_days: must be at most {MAX_COOKIE_EXPIRATION_DAYS}, got {}",
                self.cookies.expiration_days
            )));
        }
        Url::parse(&self.endpoints.base_url)
            .map_err(|e| FolioError::Config(format!("endpoints.base_url: {e}")))?;
        Url::parse(&self.endpoints.contact_form)
            .map_err(|e| FolioError::Config(format!("endpoints.contact_form: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for config.
    use super::*;

    /// Validates the defaults mirror the shipped site.
    ///
    /// Assertions:
    /// - Confirms three languages with German as default.
    /// - Confirms the default configuration validates.
    #[test]
    fn test_defaults_are_valid() {
        let config = FolioConfig::default();
        assert_eq!(config.languages.len(), 3);
        assert_eq!(config.default_language, "de");
        assert_eq!(config.languages["ru"].og_locale, "ru_RU");
        assert_eq!(config.timing.scroll_throttle(), Duration::from_millis(10));
        assert_eq!(config.cookies.consent_keys(), ConsentKeys::default());
        assert!(config.validate().is_ok());
    }

    /// Validates rejection of an unknown default language.
    ///
    /// Assertions:
    /// - Ensures a `Config` error mentioning the field.
    #[test]
    fn test_default_language_must_exist() {
        let config = FolioConfig { default_language: "fr".into(), ..FolioConfig::default() };
        let err = config.validate().unwrap_err();
        assert!(matches!(&err, FolioError::Config(msg) if msg.contains("default_language")));
    }

    /// Validates rejection of an empty language table.
    ///
    /// Assertions:
    /// - Ensures a `Config` error.
    #[test]
    fn test_languages_required() {
        let config = FolioConfig { languages: BTreeMap::new(), ..FolioConfig::default() };
        assert!(matches!(config.validate(), Err(FolioError::Config(_))));
    }

    /// Validates rejection of zero timing values.
    ///
    /// Assertions:
    /// - Ensures the offending field is named.
    #[test]
    fn test_zero_timing_rejected() {
        let mut config = FolioConfig::default();
        config.timing.resize_debounce_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timing.resize_debounce_ms"));
    }

    /// Validates the cookie lifetime upper bound.
    ///
    /// Assertions:
    /// - Confirms ten years is accepted.
    /// - Ensures anything longer is rejected with the field named.
    #[test]
    fn test_cookie_lifetime_capped() {
        let mut config = FolioConfig::default();
        config.cookies.expiration_days = MAX_COOKIE_EXPIRATION_DAYS;
        assert!(config.validate().is_ok());

        config.cookies.expiration_days = 100_000;
        let err = config.validate().unwrap_err();
        assert!(matches!(&err, FolioError::Config(msg) if msg.contains("cookies.expiration_days")));
    }

    /// Validates that partial documents fill in defaults.
    ///
    /// Assertions:
    /// - Confirms unspecified sections keep their defaults.
    #[test]
    fn test_partial_document() {
        let config: FolioConfig =
            serde_json::from_str(r#"{"default_language": "en", "ui": {"header_height": 64}}"#)
                .unwrap();
        assert_eq!(config.default_language, "en");
        assert!((config.ui.header_height - 64.0).abs() < f64::EPSILON);
        assert!((config.ui.back_to_top_threshold - 300.0).abs() < f64::EPSILON);
        assert_eq!(config.endpoints.skills, "js/data/skills.json");
    }
}
