//! Colour theme

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use folio_common::compliance::THEME_KEY;
use folio_common::PreferenceStore;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::FolioError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The other theme
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(FolioError::Validation(format!("unknown theme '{other}'"))),
        }
    }
}

/// Holds the active theme and persists user choices
#[derive(Debug)]
pub struct ThemeController {
    current: Theme,
    store: Arc<PreferenceStore>,
}

impl ThemeController {
    /// Pick the initial theme
    ///
    /// Order: stored preference, then the system preference when known,
    /// then `default`.
    pub fn new(store: Arc<PreferenceStore>, default: Theme, prefers_dark: Option<bool>) -> Self {
        let stored = store.get::<String>(THEME_KEY).and_then(|raw| raw.parse::<Theme>().ok());
        let current = stored.unwrap_or(match prefers_dark {
            Some(true) => Theme::Dark,
            Some(false) => Theme::Light,
            None => default,
        });
        info!(theme = %current, from_store = stored.is_some(), "theme initialized");
        Self { current, store }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    /// Switch theme for this session only
    pub fn apply(&mut self, theme: Theme) {
        self.current = theme;
    }

    /// Switch theme and remember it
    pub fn set(&mut self, theme: Theme) {
        self.apply(theme);
        self.store.set_preference(THEME_KEY, &serde_json::Value::from(theme.as_str()));
    }

    /// Flip the theme, persist it and return the new one
    pub fn toggle(&mut self) -> Theme {
        let next = self.current.toggled();
        self.set(next);
        info!(theme = %next, "theme toggled");
        next
    }
}
