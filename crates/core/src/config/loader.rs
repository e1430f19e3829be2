//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the required ones are missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `FOLIO_BASE_URL`: Base URL for data feeds (required)
//! - `FOLIO_CONTACT_ENDPOINT`: Contact form endpoint (required)
//! - `FOLIO_SITE_TITLE`: Fallback page title
//! - `FOLIO_DEFAULT_LANGUAGE`: Language used when none is stored
//! - `FOLIO_DEFAULT_THEME`: `light` or `dark`
//! - `FOLIO_CAPTCHA_SITE_KEY`: reCAPTCHA site key; unset disables captcha
//! - `FOLIO_COOKIE_EXPIRATION_DAYS`: Durable-tier lifetime in days
//! - `FOLIO_HTTP_TIMEOUT`: Per-request timeout in seconds
//! - `FOLIO_LOG_LEVEL`: Default tracing filter
//! - `FOLIO_LOG_JSON`: Emit JSON log lines (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./folio.toml`, `./folio.json`, `./config.toml`, `./config.json`
//! 2. The same names in the parent and grandparent directories
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::FolioConfig;
use crate::error::{FolioError, Result};

const CONFIG_FILE_NAMES: [&str; 4] = ["folio.toml", "folio.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `FolioError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> Result<FolioConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `FOLIO_BASE_URL` and `FOLIO_CONTACT_ENDPOINT` must be present; the rest
/// override defaults when set.
///
/// # Errors
/// Returns `FolioError::Config` if required variables are missing, a value
/// does not parse, or the result fails validation.
pub fn load_from_env() -> Result<FolioConfig> {
    let mut config = FolioConfig::default();
    config.endpoints.base_url = env_var("FOLIO_BASE_URL")?;
    config.endpoints.contact_form = env_var("FOLIO_CONTACT_ENDPOINT")?;

    if let Ok(title) = std::env::var("FOLIO_SITE_TITLE") {
        config.site_title = title;
    }
    if let Ok(language) = std::env::var("FOLIO_DEFAULT_LANGUAGE") {
        config.default_language = language;
    }
    if let Ok(theme) = std::env::var("FOLIO_DEFAULT_THEME") {
        config.default_theme = theme;
    }
    config.captcha.site_key =
        std::env::var("FOLIO_CAPTCHA_SITE_KEY").ok().filter(|key| !key.trim().is_empty());
    if let Some(days) = env_parse("FOLIO_COOKIE_EXPIRATION_DAYS", "cookie expiration days")? {
        config.cookies.expiration_days = days;
    }
    if let Some(timeout) = env_parse("FOLIO_HTTP_TIMEOUT", "HTTP timeout")? {
        config.endpoints.timeout_seconds = timeout;
    }
    if let Ok(level) = std::env::var("FOLIO_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("FOLIO_LOG_JSON", config.logging.json);

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `FolioError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The parsed configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<FolioConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(FolioError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            FolioError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| FolioError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<FolioConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| FolioError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| FolioError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(FolioError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, its parent and grandparent,
/// then the same three levels relative to the executable.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend(cwd.ancestors().take(3).map(Path::to_path_buf));
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend(exe_dir.ancestors().take(3).map(Path::to_path_buf));
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| FolioError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional environment variable
fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .ok()
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| FolioError::Config(format!("Invalid {what}: {e}")))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::{Builder, NamedTempFile};

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ENV_KEYS: [&str; 10] = [
        "FOLIO_BASE_URL",
        "FOLIO_CONTACT_ENDPOINT",
        "FOLIO_SITE_TITLE",
        "FOLIO_DEFAULT_LANGUAGE",
        "FOLIO_DEFAULT_THEME",
        "FOLIO_CAPTCHA_SITE_KEY",
        "FOLIO_COOKIE_EXPIRATION_DAYS",
        "FOLIO_HTTP_TIMEOUT",
        "FOLIO_LOG_LEVEL",
        "FOLIO_LOG_JSON",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    fn temp_config(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        for (key, value) in [
            ("TEST_FOLIO_BOOL_1", "1"),
            ("TEST_FOLIO_BOOL_TRUE", "TRUE"),
            ("TEST_FOLIO_BOOL_YES", "yes"),
            ("TEST_FOLIO_BOOL_ON", "on"),
        ] {
            std::env::set_var(key, value);
            assert!(env_bool(key, false), "{value} should parse as true");
            std::env::remove_var(key);
        }

        for (key, value) in [("TEST_FOLIO_BOOL_0", "0"), ("TEST_FOLIO_BOOL_OFF", "off")] {
            std::env::set_var(key, value);
            assert!(!env_bool(key, true), "{value} should parse as false");
            std::env::remove_var(key);
        }

        std::env::remove_var("TEST_FOLIO_BOOL_MISSING");
        assert!(env_bool("TEST_FOLIO_BOOL_MISSING", true));
        assert!(!env_bool("TEST_FOLIO_BOOL_MISSING", false));
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("FOLIO_BASE_URL", "https://example.org/");
        std::env::set_var("FOLIO_CONTACT_ENDPOINT", "https://forms.example.org/f/abc");
        std::env::set_var("FOLIO_DEFAULT_LANGUAGE", "en");
        std::env::set_var("FOLIO_DEFAULT_THEME", "dark");
        std::env::set_var("FOLIO_CAPTCHA_SITE_KEY", "site-key");
        std::env::set_var("FOLIO_COOKIE_EXPIRATION_DAYS", "7");
        std::env::set_var("FOLIO_LOG_JSON", "yes");

        let result = load_from_env();
        assert!(result.is_ok(), "Should load config from env vars, error: {:?}", result.err());

        let config = result.unwrap();
        assert_eq!(config.endpoints.base_url, "https://example.org/");
        assert_eq!(config.endpoints.contact_form, "https://forms.example.org/f/abc");
        assert_eq!(config.default_language, "en");
        assert_eq!(config.default_theme, "dark");
        assert_eq!(config.captcha.site_key.as_deref(), Some("site-key"));
        assert_eq!(config.cookies.expiration_days, 7);
        assert!(config.logging.json);

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("FOLIO_BASE_URL", "https://example.org/");

        let err = load_from_env().unwrap_err();
        assert!(
            matches!(&err, FolioError::Config(msg) if msg.contains("FOLIO_CONTACT_ENDPOINT")),
            "unexpected error: {err}"
        );

        clear_env();
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("FOLIO_BASE_URL", "https://example.org/");
        std::env::set_var("FOLIO_CONTACT_ENDPOINT", "https://forms.example.org/f/abc");
        std::env::set_var("FOLIO_COOKIE_EXPIRATION_DAYS", "a week");

        assert!(matches!(load_from_env(), Err(FolioError::Config(_))));

        clear_env();
    }

    #[test]
    fn test_load_from_env_unknown_default_language() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("FOLIO_BASE_URL", "https://example.org/");
        std::env::set_var("FOLIO_CONTACT_ENDPOINT", "https://forms.example.org/f/abc");
        std::env::set_var("FOLIO_DEFAULT_LANGUAGE", "fr");

        assert!(matches!(load_from_env(), Err(FolioError::Config(_))));

        clear_env();
    }

    #[test]
    fn test_load_from_file_json() {
        let file = temp_config(
            ".json",
            r#"{
                "site_title": "Jane Doe",
                "default_language": "en",
                "timing": { "scroll_throttle_ms": 16 }
            }"#,
        );

        let config = load_from_file(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.site_title, "Jane Doe");
        assert_eq!(config.default_language, "en");
        assert_eq!(config.timing.scroll_throttle_ms, 16);
        assert_eq!(config.timing.input_debounce_ms, 300);
    }

    #[test]
    fn test_load_from_file_toml() {
        let file = temp_config(
            ".toml",
            r#"
                default_theme = "dark"

                [endpoints]
                base_url = "https://cdn.example.org/site/"

                [languages.en]
                name = "English"
                og_locale = "en_GB"
            "#,
        );

        let result = load_from_file(Some(file.path().to_path_buf()));
        // Replacing the language table drops German, the default
        assert!(matches!(result, Err(FolioError::Config(msg)) if msg.contains("default_language")));

        let file = temp_config(
            ".toml",
            r#"
                default_theme = "dark"
                default_language = "en"

                [endpoints]
                base_url = "https://cdn.example.org/site/"

                [languages.en]
                name = "English"
                og_locale = "en_GB"
            "#,
        );
        let config = load_from_file(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.default_theme, "dark");
        assert_eq!(config.endpoints.base_url, "https://cdn.example.org/site/");
        assert_eq!(config.languages.len(), 1);
        assert_eq!(config.languages["en"].og_locale, "en_GB");
    }

    #[test]
    fn test_load_from_file_missing() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/folio.toml")));
        assert!(matches!(result, Err(FolioError::Config(msg)) if msg.contains("not found")));
    }

    #[test]
    fn test_parse_config_invalid_json() {
        let result = parse_config("{ not json", Path::new("folio.json"));
        assert!(matches!(result, Err(FolioError::Config(msg)) if msg.contains("Invalid JSON")));
    }

    #[test]
    fn test_parse_config_unsupported_extension() {
        let result = parse_config("key: value", Path::new("folio.yaml"));
        assert!(matches!(result, Err(FolioError::Config(msg)) if msg.contains("Unsupported")));
    }
}
