//! Consent and preference compliance
//!
//! - **[`consent`]**: the tri-state consent decision and its sub-flags
//! - **[`preferences`]**: the two-tier [`PreferenceStore`] that honours them

pub mod consent;
pub mod error;
pub mod preferences;

pub use consent::{ConsentDecision, ConsentKeys, ConsentState};
pub use error::{PreferenceError, PreferenceResult};
pub use preferences::{
    LogOnlyReload, PreferenceStore, ReloadHandler, UserSettings, LANGUAGE_KEY, RELOAD_DELAY,
    THEME_KEY,
};
