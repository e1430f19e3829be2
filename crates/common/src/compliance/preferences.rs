//! Consent-aware preference store
//!
//! Routes preference reads and writes between the fast tier and the durable
//! tier according to the recorded consent:
//!
//! - storage enabled: writes go to both tiers, reads prefer the fast tier
//! - storage disabled: the fast tier is never written, reads use the
//!   durable tier only
//!
//! Preference writes are best-effort. A failing tier is logged and the
//! other tier still gets the value. Consent changes propagate storage
//! errors, since the decision itself must persist.
//!
//! The two tiers are written one after the other with no transaction; a
//! crash in between leaves them out of sync until the next write.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::consent::{ConsentDecision, ConsentKeys, ConsentState};
use super::error::{PreferenceError, PreferenceResult};
use crate::storage::{KeyValueStore, StorageResult};
use crate::time::saturating_millis;

/// Preference key holding the colour theme
pub const THEME_KEY: &str = "theme";
/// Preference key holding the UI language
pub const LANGUAGE_KEY: &str = "language";
/// Delay between rejecting consent and the reload request
pub const RELOAD_DELAY: Duration = Duration::from_millis(500);

/// Receives the request to rebuild all UI state after a consent rejection
pub trait ReloadHandler: Send + Sync {
    /// Schedule a full reload after `delay`
    fn request_reload(&self, delay: Duration);
}

/// Reload handler that only logs the request
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyReload;

impl ReloadHandler for LogOnlyReload {
    fn request_reload(&self, delay: Duration) {
        info!(delay_ms = saturating_millis(delay), "reload requested");
    }
}

/// Snapshot of user-facing settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserSettings {
    /// Stored theme, if any
    pub theme: Option<String>,
    /// Stored language, if any
    pub language: Option<String>,
    /// Consent decision is `accepted`
    pub cookies_accepted: bool,
    /// Fast tier may hold preferences
    pub preferences_enabled: bool,
    /// Analytics may run
    pub analytics_enabled: bool,
}

/// Two-tier preference store governed by consent
pub struct PreferenceStore {
    fast: Arc<dyn KeyValueStore>,
    durable: Arc<dyn KeyValueStore>,
    consent_keys: ConsentKeys,
    known_keys: Vec<String>,
    reload: Arc<dyn ReloadHandler>,
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("consent_keys", &self.consent_keys)
            .field("known_keys", &self.known_keys)
            .finish_non_exhaustive()
    }
}

impl PreferenceStore {
    /// Store over the given tiers with default key names
    pub fn new(fast: Arc<dyn KeyValueStore>, durable: Arc<dyn KeyValueStore>) -> Self {
        Self {
            fast,
            durable,
            consent_keys: ConsentKeys::default(),
            known_keys: vec![THEME_KEY.to_string(), LANGUAGE_KEY.to_string()],
            reload: Arc::new(LogOnlyReload),
        }
    }

    /// Override the durable key names of the consent record
    #[must_use]
    pub fn with_consent_keys(mut self, keys: ConsentKeys) -> Self {
        self.consent_keys = keys;
        self
    }

    /// Override the preference keys purged by rejection and clearing
    #[must_use]
    pub fn with_known_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Install the handler that performs reloads
    #[must_use]
    pub fn with_reload_handler(mut self, reload: Arc<dyn ReloadHandler>) -> Self {
        self.reload = reload;
        self
    }

    /// Preference keys this store manages
    pub fn known_keys(&self) -> &[String] {
        &self.known_keys
    }

    /// Current consent record
    pub fn consent(&self) -> ConsentState {
        let keys = &self.consent_keys;
        let decision = self.durable_raw(&keys.decision);
        let preferences = self.durable_raw(&keys.preferences);
        let analytics = self.durable_raw(&keys.analytics);
        ConsentState::from_stored(decision.as_deref(), preferences.as_deref(), analytics.as_deref())
    }

    /// Whether the fast tier may be used
    ///
    /// An unreadable durable tier counts as disabled.
    pub fn non_essential_enabled(&self) -> bool {
        match self.durable.get(&self.consent_keys.preferences) {
            Ok(value) => value.as_deref() != Some("false"),
            Err(err) => {
                warn!(key = %self.consent_keys.preferences, error = %err, "consent flag unreadable, treating storage as disabled");
                false
            }
        }
    }

    /// Read a preference
    pub fn get_preference(&self, key: &str) -> Option<Value> {
        if self.non_essential_enabled() {
            if let Some(value) = self.fast_value(key) {
                return Some(value);
            }
        }
        self.durable_value(key)
    }

    /// Write a preference
    pub fn set_preference(&self, key: &str, value: &Value) {
        if self.non_essential_enabled() {
            match serde_json::to_string(value) {
                Ok(encoded) => log_failure(key, "fast", self.fast.set(key, &encoded)),
                Err(err) => warn!(key, error = %err, "preference not serializable"),
            }
        } else {
            debug!(key, "non-essential storage disabled, skipping fast tier");
        }
        log_failure(key, "durable", self.durable.set(key, &durable_encode(value)));
    }

    /// Read and deserialize a preference
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get_preference(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(err) => {
                debug!(key, error = %err, "stored preference has unexpected shape");
                None
            }
        }
    }

    /// Serialize and write a preference
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError::Serialization`] when `value` cannot be
    /// represented as JSON. Tier failures are logged, not returned.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> PreferenceResult<()> {
        let value = serde_json::to_value(value)?;
        self.set_preference(key, &value);
        Ok(())
    }

    /// Delete one preference from both tiers
    pub fn remove_preference(&self, key: &str) {
        log_failure(key, "fast", self.fast.remove(key));
        log_failure(key, "durable", self.durable.remove(key));
    }

    /// Delete every known preference and the consent sub-flags
    ///
    /// The decision marker itself is kept.
    pub fn clear_preferences(&self) {
        for key in &self.known_keys {
            self.remove_preference(key);
        }
        let keys = &self.consent_keys;
        log_failure(&keys.preferences, "durable", self.durable.remove(&keys.preferences));
        log_failure(&keys.analytics, "durable", self.durable.remove(&keys.analytics));
    }

    /// Record acceptance and enable both sub-flags
    ///
    /// # Errors
    ///
    /// Fails with [`PreferenceError::ConsentAlreadyDecided`] after a
    /// rejection, or with a storage error if the record cannot be written.
    pub fn accept_consent(&self) -> PreferenceResult<()> {
        self.transition(ConsentDecision::Accepted)?;
        self.write_flags(true, true)?;
        info!("consent accepted");
        Ok(())
    }

    /// Record rejection, purge known preferences and request a reload
    ///
    /// # Errors
    ///
    /// Fails with [`PreferenceError::ConsentAlreadyDecided`] after an
    /// acceptance, or with a storage error if the record cannot be written.
    pub fn reject_consent(&self) -> PreferenceResult<()> {
        self.transition(ConsentDecision::Rejected)?;
        self.write_flags(false, false)?;
        for key in &self.known_keys {
            self.remove_preference(key);
        }
        info!(purged = self.known_keys.len(), "consent rejected");
        self.reload.request_reload(RELOAD_DELAY);
        Ok(())
    }

    /// Change the sub-flags without touching the decision
    ///
    /// Disabling storage purges known preferences from the fast tier.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a flag cannot be written.
    pub fn update_consent_flags(&self, preferences: bool, analytics: bool) -> PreferenceResult<()> {
        self.write_flags(preferences, analytics)?;
        if !preferences {
            for key in &self.known_keys {
                log_failure(key, "fast", self.fast.remove(key));
            }
        }
        debug!(preferences, analytics, "consent flags updated");
        Ok(())
    }

    /// Current theme, language and consent flags
    pub fn settings(&self) -> UserSettings {
        let consent = self.consent();
        UserSettings {
            theme: self.get::<String>(THEME_KEY),
            language: self.get::<String>(LANGUAGE_KEY),
            cookies_accepted: consent.decision == ConsentDecision::Accepted,
            preferences_enabled: consent.preferences_enabled,
            analytics_enabled: consent.analytics_enabled,
        }
    }

    /// Persist theme, language and sub-flags
    ///
    /// The decision is only changed through [`Self::accept_consent`] and
    /// [`Self::reject_consent`], so `cookies_accepted` is ignored here.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a sub-flag cannot be written.
    pub fn save_settings(&self, settings: &UserSettings) -> PreferenceResult<()> {
        self.update_consent_flags(settings.preferences_enabled, settings.analytics_enabled)?;
        if let Some(theme) = &settings.theme {
            self.set_preference(THEME_KEY, &Value::String(theme.clone()));
        }
        if let Some(language) = &settings.language {
            self.set_preference(LANGUAGE_KEY, &Value::String(language.clone()));
        }
        Ok(())
    }

    fn transition(&self, requested: ConsentDecision) -> PreferenceResult<()> {
        let current = ConsentDecision::from_stored(
            self.durable.get(&self.consent_keys.decision)?.as_deref(),
        );
        if current.is_decided() && current != requested {
            return Err(PreferenceError::ConsentAlreadyDecided { current, requested });
        }
        if let Some(stored) = requested.as_stored() {
            self.durable.set(&self.consent_keys.decision, stored)?;
        }
        Ok(())
    }

    fn write_flags(&self, preferences: bool, analytics: bool) -> PreferenceResult<()> {
        self.durable.set(&self.consent_keys.preferences, bool_str(preferences))?;
        self.durable.set(&self.consent_keys.analytics, bool_str(analytics))?;
        Ok(())
    }

    fn durable_raw(&self, key: &str) -> Option<String> {
        self.durable.get(key).unwrap_or_else(|err| {
            warn!(key, error = %err, "durable read failed");
            None
        })
    }

    fn fast_value(&self, key: &str) -> Option<Value> {
        let raw = self.fast.get(key).unwrap_or_else(|err| {
            warn!(key, error = %err, "fast read failed");
            None
        })?;
        Some(serde_json::from_str(&raw).unwrap_or(Value::String(raw)))
    }

    fn durable_value(&self, key: &str) -> Option<Value> {
        self.durable_raw(key).map(|raw| durable_decode(&raw))
    }
}

fn bool_str(flag: bool) -> &'static str {
    if flag {
        "true"
    } else {
        "false"
    }
}

/// Strings are stored raw, everything else as JSON text
fn durable_encode(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// JSON text is parsed back, anything else is a plain string
fn durable_decode(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Object(_) | Value::Array(_) | Value::Number(_) | Value::Bool(_))) => {
            value
        }
        _ => Value::String(raw.to_string()),
    }
}

fn log_failure(key: &str, tier: &'static str, result: StorageResult<()>) {
    if let Err(err) = result {
        warn!(key, tier, error = %err, "preference storage write failed");
    }
}
