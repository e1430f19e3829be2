//! # Folio Core
//!
//! Client logic for the portfolio site.
//!
//! This crate contains:
//! - Configuration loading and tracing setup
//! - Translations, theme and content models
//! - HTTP adapters for the data feeds and the contact form
//! - The start-up pipeline ([`AppContext`])
//!
//! ## Architecture
//! - Builds on `folio-common` for storage, consent and timing primitives
//! - Feeds reach the pipeline through the [`ContentSource`] port
//! - All fallible operations return [`FolioError`]

pub mod app;
pub mod config;
pub mod contact;
pub mod content;
pub mod error;
pub mod feeds;
pub mod i18n;
pub mod scroll;
pub mod telemetry;
pub mod theme;

// Re-export commonly used items
pub use app::{AppContext, InitOptions, InitReport, InitStep};
pub use config::FolioConfig;
pub use contact::{CaptchaProvider, ContactClient, ContactError, ContactForm};
pub use content::{LocalizedText, Project, ProjectFilter, ProjectsDocument, SkillsDocument};
pub use error::{FolioError, Result};
pub use feeds::{ContentSource, FeedClient};
pub use i18n::{LanguageController, PageMeta, Translations};
pub use scroll::{ScrollMetrics, ScrollState, ScrollTracker};
pub use telemetry::init_tracing;
pub use theme::{Theme, ThemeController};
