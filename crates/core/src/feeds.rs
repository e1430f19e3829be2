//! JSON data feeds
//!
//! [`FeedClient`] fetches the translation, skills, projects and schema
//! documents relative to a base URL. [`ContentSource`] is the port the
//! start-up pipeline depends on, so tests can substitute their own source.

use std::time::Duration;

use async_trait::async_trait;
use folio_common::{retry_with_backoff, RetryPolicy};
use reqwest::Client as ReqwestClient;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::EndpointsConfig;
use crate::content::{ProjectsDocument, SkillsDocument};
use crate::error::{FolioError, Result};
use crate::i18n::Translations;

/// Source of the documents loaded at start-up
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn translations(&self) -> Result<Translations>;
    async fn skills(&self) -> Result<SkillsDocument>;
    async fn projects(&self) -> Result<ProjectsDocument>;
}

/// HTTP client for the site's JSON feeds
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: ReqwestClient,
    base: Url,
    endpoints: EndpointsConfig,
    retry: RetryPolicy,
}

impl FeedClient {
    /// Build a client for `endpoints`
    ///
    /// Requests are not retried unless [`FeedClient::with_retry`] is used.
    ///
    /// # Errors
    /// Returns `FolioError::Config` for an unparsable base URL or when the
    /// HTTP client cannot be built.
    pub fn new(endpoints: &EndpointsConfig) -> Result<Self> {
        let base = Url::parse(&endpoints.base_url)?;
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(endpoints.timeout_seconds))
            .build()
            .map_err(|e| FolioError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, base, endpoints: endpoints.clone(), retry: RetryPolicy::no_retry() })
    }

    /// Retry transient failures according to `policy`
    ///
    /// # Errors
    /// Returns `FolioError::Config` when the policy fails
    /// [`RetryPolicy::validate`].
    pub fn with_retry(mut self, policy: RetryPolicy) -> Result<Self> {
        policy.validate()?;
        self.retry = policy;
        Ok(self)
    }

    /// Resolve a feed path against the base URL
    ///
    /// # Errors
    /// Returns `FolioError::Config` when the result is not a valid URL.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    /// Fetch and decode one JSON document
    ///
    /// # Errors
    /// - `FolioError::Http` for a non-success status
    /// - `FolioError::Validation` for a body that does not decode as `T`
    /// - `FolioError::Network` for transport failures
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        retry_with_backoff(self.retry, || self.fetch_once(url)).await
    }

    async fn fetch_once<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        debug!(%url, "fetching feed");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        debug!(%url, %status, "received feed response");
        if !status.is_success() {
            return Err(FolioError::Http { status: status.as_u16(), url: url.to_string() });
        }
        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| FolioError::Validation(format!("malformed feed {url}: {e}")))
    }

    async fn fetch_path<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.resolve(path)?;
        self.fetch_json(&url).await
    }

    /// Site-wide structured data, passed through untouched
    ///
    /// # Errors
    /// See [`FeedClient::fetch_json`].
    pub async fn schema(&self) -> Result<Value> {
        self.fetch_path(&self.endpoints.schema).await
    }

    /// Translations, or an empty catalog when the feed fails
    pub async fn translations_or_fallback(&self) -> Translations {
        or_fallback("translations", self.translations().await, Translations::default)
    }

    /// Skills, or the built-in overview when the feed fails
    pub async fn skills_or_fallback(&self) -> SkillsDocument {
        or_fallback("skills", self.skills().await, SkillsDocument::fallback)
    }

    /// Projects, or an empty list when the feed fails
    pub async fn projects_or_fallback(&self) -> ProjectsDocument {
        or_fallback("projects", self.projects().await, ProjectsDocument::fallback)
    }
}

fn or_fallback<T>(feed: &str, result: Result<T>, fallback: impl FnOnce() -> T) -> T {
    result.unwrap_or_else(|err| {
        warn!(feed, error = %err, error_type = err.label(), "feed unavailable, using fallback");
        fallback()
    })
}

#[async_trait]
impl ContentSource for FeedClient {
    async fn translations(&self) -> Result<Translations> {
        self.fetch_path(&self.endpoints.translations).await
    }

    async fn skills(&self) -> Result<SkillsDocument> {
        self.fetch_path(&self.endpoints.skills).await
    }

    async fn projects(&self) -> Result<ProjectsDocument> {
        self.fetch_path(&self.endpoints.projects).await
    }
}
