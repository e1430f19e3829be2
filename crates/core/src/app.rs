//! Application context - start-up pipeline and shared state
//!
//! [`AppContext::init`] runs the client start-up in a fixed order:
//!
//! 1. read the consent record
//! 2. pick the theme
//! 3. load translations (empty catalog on failure)
//! 4. pick the language
//! 5. load skills and projects together (built-in fallbacks on failure)
//!
//! Feed failures never abort start-up; they are logged and recorded in the
//! [`InitReport`]. Cancelling the token before step 5 completes aborts with
//! `FolioError::Cancelled`.

use std::future::Future;
use std::sync::Arc;

use folio_common::{ConsentState, Debounce, PreferenceStore};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::config::FolioConfig;
use crate::contact::ContactClient;
use crate::content::{ProjectsDocument, SkillsDocument};
use crate::error::{FolioError, Result};
use crate::feeds::ContentSource;
use crate::i18n::{LanguageController, Translations};
use crate::scroll::{ScrollState, ScrollTracker};
use crate::theme::{Theme, ThemeController};

/// Type alias for content source port trait object
pub type DynContentSource = dyn ContentSource + Send + Sync + 'static;

/// Start-up steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitStep {
    Consent,
    Theme,
    Translations,
    Language,
    Content,
}

impl InitStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Consent => "consent",
            Self::Theme => "theme",
            Self::Translations => "translations",
            Self::Language => "language",
            Self::Content => "content",
        }
    }
}

/// What start-up did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitReport {
    /// Steps that finished, in order
    pub completed: Vec<InitStep>,
    pub translations_fallback: bool,
    pub skills_fallback: bool,
    pub projects_fallback: bool,
}

impl InitReport {
    /// Whether any step had to use built-in data
    pub fn used_fallback(&self) -> bool {
        self.translations_fallback || self.skills_fallback || self.projects_fallback
    }
}

/// Inputs to [`AppContext::init`] that do not come from configuration
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// System colour-scheme preference, when the host knows it
    pub prefers_dark: Option<bool>,
    /// Cancels start-up and, later, everything the context spawned
    pub cancel: CancellationToken,
}

/// Application context - holds the client's state and services
pub struct AppContext {
    config: FolioConfig,
    store: Arc<PreferenceStore>,
    consent: ConsentState,
    theme: ThemeController,
    language: LanguageController,
    skills: Option<SkillsDocument>,
    projects: Option<ProjectsDocument>,
    report: InitReport,
    cancel: CancellationToken,
    disposed: bool,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("consent", &self.consent)
            .field("theme", &self.theme.current())
            .field("language", &self.language.current())
            .field("report", &self.report)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Run the start-up pipeline
    ///
    /// # Errors
    /// - `FolioError::Config` when `config` fails validation
    /// - `FolioError::Cancelled` when `options.cancel` fires before the
    ///   content step completes
    #[instrument(skip_all, fields(default_language = %config.default_language))]
    pub async fn init(
        config: FolioConfig,
        store: Arc<PreferenceStore>,
        source: Arc<DynContentSource>,
        options: InitOptions,
    ) -> Result<Self> {
        config.validate()?;
        let cancel = options.cancel;
        let mut report = InitReport::default();

        ensure_active(&cancel, InitStep::Consent)?;
        let consent = store.consent();
        info!(
            decision = %consent.decision,
            needs_prompt = consent.needs_prompt(),
            "consent state loaded"
        );
        report.completed.push(InitStep::Consent);

        ensure_active(&cancel, InitStep::Theme)?;
        let default_theme: Theme = config.default_theme.parse()?;
        let theme = ThemeController::new(Arc::clone(&store), default_theme, options.prefers_dark);
        report.completed.push(InitStep::Theme);

        let translations =
            match until_cancelled(&cancel, InitStep::Translations, source.translations()).await? {
                Ok(translations) => translations,
                Err(err) => {
                    warn!(error = %err, error_type = err.label(), "translations unavailable, using empty catalog");
                    report.translations_fallback = true;
                    Translations::default()
                }
            };
        report.completed.push(InitStep::Translations);

        ensure_active(&cancel, InitStep::Language)?;
        let language = LanguageController::new(&config, Arc::clone(&store), Arc::new(translations));
        report.completed.push(InitStep::Language);

        let (skills, projects) = until_cancelled(&cancel, InitStep::Content, async {
            tokio::join!(source.skills(), source.projects())
        })
        .await?;
        let skills = skills.unwrap_or_else(|err| {
            warn!(error = %err, error_type = err.label(), "skills unavailable, using fallback");
            report.skills_fallback = true;
            SkillsDocument::fallback()
        });
        let projects = projects.unwrap_or_else(|err| {
            warn!(error = %err, error_type = err.label(), "projects unavailable, using fallback");
            report.projects_fallback = true;
            ProjectsDocument::fallback()
        });
        report.completed.push(InitStep::Content);

        info!(
            theme = %theme.current(),
            language = %language.current(),
            fallback = report.used_fallback(),
            "application initialized"
        );

        Ok(Self {
            config,
            store,
            consent,
            theme,
            language,
            skills: Some(skills),
            projects: Some(projects),
            report,
            cancel,
            disposed: false,
        })
    }

    pub fn config(&self) -> &FolioConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<PreferenceStore> {
        &self.store
    }

    pub fn report(&self) -> &InitReport {
        &self.report
    }

    /// Consent record as of start-up or the last consent change
    pub fn consent(&self) -> ConsentState {
        self.consent
    }

    pub fn theme(&self) -> &ThemeController {
        &self.theme
    }

    pub fn language(&self) -> &LanguageController {
        &self.language
    }

    /// Loaded skills; `None` after [`Self::dispose`]
    pub fn skills(&self) -> Option<&SkillsDocument> {
        self.skills.as_ref()
    }

    /// Loaded projects; `None` after [`Self::dispose`]
    pub fn projects(&self) -> Option<&ProjectsDocument> {
        self.projects.as_ref()
    }

    /// Token cancelled together with this context
    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Flip the theme and persist it
    ///
    /// # Errors
    /// Returns `FolioError::Cancelled` after [`Self::dispose`].
    pub fn toggle_theme(&mut self) -> Result<Theme> {
        self.ensure_live()?;
        Ok(self.theme.toggle())
    }

    /// Switch language; returns the new Open Graph locale
    ///
    /// # Errors
    /// `FolioError::Validation` for an unsupported code, or
    /// `FolioError::Cancelled` after [`Self::dispose`].
    pub fn change_language(&mut self, code: &str) -> Result<String> {
        self.ensure_live()?;
        self.language.change(code).map(str::to_string)
    }

    /// Accept the consent banner
    ///
    /// # Errors
    /// `FolioError::Validation` after an earlier rejection, storage
    /// failures, or `FolioError::Cancelled` after [`Self::dispose`].
    pub fn accept_consent(&mut self) -> Result<ConsentState> {
        self.ensure_live()?;
        self.store.accept_consent()?;
        self.consent = self.store.consent();
        Ok(self.consent)
    }

    /// Reject the consent banner; the store purges preferences and
    /// requests a reload
    ///
    /// # Errors
    /// As for [`Self::accept_consent`].
    pub fn reject_consent(&mut self) -> Result<ConsentState> {
        self.ensure_live()?;
        self.store.reject_consent()?;
        self.consent = self.store.consent();
        Ok(self.consent)
    }

    /// Save the privacy-modal sub-flags
    ///
    /// # Errors
    /// As for [`Self::accept_consent`].
    pub fn update_consent_flags(
        &mut self,
        preferences: bool,
        analytics: bool,
    ) -> Result<ConsentState> {
        self.ensure_live()?;
        self.store.update_consent_flags(preferences, analytics)?;
        self.consent = self.store.consent();
        Ok(self.consent)
    }

    /// Scroll tracker using the configured interval and layout thresholds
    ///
    /// # Errors
    /// `FolioError::Config` for a zero interval.
    pub fn scroll_tracker<F>(&self, handler: F) -> Result<ScrollTracker>
    where
        F: Fn(ScrollState) + Send + Sync + 'static,
    {
        ScrollTracker::new(self.config.ui, self.config.timing.scroll_throttle(), handler)
    }

    /// Debounce for viewport resize handlers, waiting `timing.resize_debounce_ms`
    ///
    /// # Errors
    /// `FolioError::Config` for a zero wait, `FolioError::Internal` outside a
    /// tokio runtime.
    pub fn resize_debouncer<A, F>(&self, handler: F) -> Result<Debounce<A>>
    where
        A: Send + 'static,
        F: Fn(A) + Send + Sync + 'static,
    {
        Ok(Debounce::new(self.config.timing.resize_debounce(), handler)?)
    }

    /// Debounce for input handlers such as live form validation, waiting
    /// `timing.input_debounce_ms`
    ///
    /// # Errors
    /// As for [`Self::resize_debouncer`].
    pub fn input_debouncer<A, F>(&self, handler: F) -> Result<Debounce<A>>
    where
        A: Send + 'static,
        F: Fn(A) + Send + Sync + 'static,
    {
        Ok(Debounce::new(self.config.timing.input_debounce(), handler)?)
    }

    /// Contact client for the configured endpoint
    ///
    /// # Errors
    /// `FolioError::Config` for an invalid endpoint.
    pub fn contact_client(&self) -> Result<ContactClient> {
        ContactClient::new(&self.config)
    }

    /// Cancel outstanding work and release loaded content
    ///
    /// Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.cancel.cancel();
        self.skills = None;
        self.projects = None;
        self.disposed = true;
        info!("application disposed");
    }

    fn ensure_live(&self) -> Result<()> {
        if self.disposed {
            return Err(FolioError::Cancelled("application context disposed".into()));
        }
        Ok(())
    }
}

fn cancelled(step: InitStep) -> FolioError {
    FolioError::Cancelled(format!("initialization cancelled at step '{}'", step.as_str()))
}

fn ensure_active(cancel: &CancellationToken, step: InitStep) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(cancelled(step));
    }
    Ok(())
}

async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    step: InitStep,
    work: F,
) -> Result<F::Output> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            warn!(step = step.as_str(), "initialization cancelled");
            Err(cancelled(step))
        }
        output = work => Ok(output),
    }
}
