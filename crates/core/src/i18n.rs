//! Translations and the active UI language
//!
//! Catalogs are plain JSON trees keyed by language code. Keys are dotted
//! paths into the tree (`nav.home`, `form.required`).

use std::collections::BTreeMap;
use std::sync::Arc;

use folio_common::compliance::LANGUAGE_KEY;
use folio_common::PreferenceStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{FolioConfig, LanguageInfo};
use crate::error::{FolioError, Result};

/// Open Graph locale used for languages missing from the table
pub const FALLBACK_OG_LOCALE: &str = "en_US";

/// Translation catalogs for every language
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Translations {
    catalogs: BTreeMap<String, Value>,
}

/// The `meta` section of a catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaSection {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
}

/// Page metadata resolved for one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    /// Document and social title
    pub title: String,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub og_locale: String,
    /// Value for the document's `lang` attribute
    pub lang: String,
}

impl Translations {
    /// Build from a catalog map
    pub fn new(catalogs: BTreeMap<String, Value>) -> Self {
        Self { catalogs }
    }

    /// Languages that have a catalog
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.catalogs.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }

    pub fn has_language(&self, lang: &str) -> bool {
        self.catalogs.contains_key(lang)
    }

    /// Node at a dotted path, or the whole catalog for an empty path
    pub fn section(&self, lang: &str, path: &str) -> Option<&Value> {
        let root = self.catalogs.get(lang)?;
        if path.is_empty() {
            return Some(root);
        }
        path.split('.').try_fold(root, |node, segment| node.get(segment))
    }

    /// Text at a dotted path; `None` unless the path ends on a string
    pub fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.section(lang, key)?.as_str()
    }

    /// Parsed `meta` section
    pub fn meta(&self, lang: &str) -> Option<MetaSection> {
        let node = self.section(lang, "meta")?;
        serde_json::from_value(node.clone()).ok()
    }
}

/// Tracks the active language and resolves keys against it
#[derive(Debug)]
pub struct LanguageController {
    languages: BTreeMap<String, LanguageInfo>,
    default_language: String,
    site_title: String,
    current: String,
    translations: Arc<Translations>,
    store: Arc<PreferenceStore>,
}

impl LanguageController {
    /// Start on the stored language when supported, else the configured
    /// default
    pub fn new(
        config: &FolioConfig,
        store: Arc<PreferenceStore>,
        translations: Arc<Translations>,
    ) -> Self {
        let stored = store.get::<String>(LANGUAGE_KEY);
        let current = match stored {
            Some(code) if config.languages.contains_key(&code) => code,
            Some(code) => {
                debug!(language = %code, "stored language not supported, using default");
                config.default_language.clone()
            }
            None => config.default_language.clone(),
        };
        info!(language = %current, "language initialized");

        Self {
            languages: config.languages.clone(),
            default_language: config.default_language.clone(),
            site_title: config.site_title.clone(),
            current,
            translations,
            store,
        }
    }

    /// Active language code
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Supported languages
    pub fn languages(&self) -> &BTreeMap<String, LanguageInfo> {
        &self.languages
    }

    /// Switch language and persist the choice
    ///
    /// Returns the Open Graph locale of the new language.
    ///
    /// # Errors
    /// Returns `FolioError::Validation` for a language not in the table.
    pub fn change(&mut self, code: &str) -> Result<&str> {
        if !self.languages.contains_key(code) {
            return Err(FolioError::Validation(format!("unsupported language '{code}'")));
        }
        self.store.set_preference(LANGUAGE_KEY, &Value::String(code.to_string()));
        self.current = code.to_string();
        info!(language = %code, "language changed");
        Ok(self.og_locale(code))
    }

    /// Open Graph locale of `code`
    pub fn og_locale(&self, code: &str) -> &str {
        self.languages.get(code).map_or(FALLBACK_OG_LOCALE, |info| info.og_locale.as_str())
    }

    /// Text for `key` in the active language, falling back to the default
    pub fn translate(&self, key: &str) -> Option<&str> {
        self.translations
            .lookup(&self.current, key)
            .or_else(|| self.translations.lookup(&self.default_language, key))
    }

    /// Text for `key`, or the key itself when no catalog has it
    pub fn translate_or_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.translate(key).unwrap_or(key)
    }

    /// Metadata for the active language
    pub fn page_meta(&self) -> PageMeta {
        let meta = self.translations.meta(&self.current).unwrap_or_default();
        PageMeta {
            title: meta.title.unwrap_or_else(|| self.site_title.clone()),
            description: meta.description,
            keywords: meta.keywords,
            og_locale: self.og_locale(&self.current).to_string(),
            lang: self.current.clone(),
        }
    }

    /// Replace the catalogs, e.g. after a late feed load
    pub fn set_translations(&mut self, translations: Arc<Translations>) {
        self.translations = translations;
    }

    pub fn translations(&self) -> &Arc<Translations> {
        &self.translations
    }
}
