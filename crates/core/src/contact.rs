//! Contact form validation and submission

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::FolioConfig;
use crate::error::{FolioError, Result};

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("EMAIL_REGEX should compile - this is a bug")
});

/// Loose address check: something, `@`, something, `.`, something
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Message,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Message => "message",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldError {
    Required,
    InvalidEmail,
}

impl FieldError {
    /// Translation key for the message shown under the field
    pub fn translation_key(self) -> &'static str {
        match self {
            Self::Required => "form.required",
            Self::InvalidEmail => "form.invalidEmail",
        }
    }

    /// English message used when no translation exists
    pub fn default_message(self) -> &'static str {
        match self {
            Self::Required => "This field is required",
            Self::InvalidEmail => "Please enter a valid email address",
        }
    }
}

/// Per-field validation failures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors(BTreeMap<Field, FieldError>);

impl FormErrors {
    pub fn get(&self, field: Field) -> Option<FieldError> {
        self.0.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, FieldError)> + '_ {
        self.0.iter().map(|(field, error)| (*field, *error))
    }

    /// Messages keyed by field, using `translate` with English fallback
    pub fn messages<F>(&self, translate: F) -> BTreeMap<Field, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.iter()
            .map(|(field, error)| {
                let message = translate(error.translation_key())
                    .unwrap_or_else(|| error.default_message().to_string());
                (field, message)
            })
            .collect()
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, error)| format!("{}: {}", field.as_str(), error.translation_key()))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), email: email.into(), message: message.into() }
    }

    /// Check one field
    pub fn validate_field(&self, field: Field) -> Option<FieldError> {
        let value = match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Message => &self.message,
        };
        if value.trim().is_empty() {
            return Some(FieldError::Required);
        }
        if field == Field::Email && !is_valid_email(value) {
            return Some(FieldError::InvalidEmail);
        }
        None
    }

    /// Check every field
    ///
    /// # Errors
    /// Returns the failures of all invalid fields.
    pub fn validate(&self) -> std::result::Result<(), FormErrors> {
        let errors: BTreeMap<_, _> = [Field::Name, Field::Email, Field::Message]
            .into_iter()
            .filter_map(|field| self.validate_field(field).map(|error| (field, error)))
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(FormErrors(errors))
        }
    }
}

/// Produces anti-spam tokens for form submissions
#[async_trait]
pub trait CaptchaProvider: Send + Sync {
    async fn token(&self, action: &str) -> Result<String>;
}

/// Failure of [`ContactClient::submit`]
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("form has invalid fields: {0}")]
    Invalid(FormErrors),

    #[error(transparent)]
    Transport(#[from] FolioError),
}

#[derive(Serialize)]
struct Submission<'a> {
    name: &'a str,
    email: &'a str,
    message: &'a str,
    #[serde(rename = "g-recaptcha-response", skip_serializing_if = "Option::is_none")]
    captcha_token: Option<String>,
}

/// Posts contact forms to the form endpoint
#[derive(Debug, Clone)]
pub struct ContactClient {
    client: ReqwestClient,
    endpoint: Url,
    captcha_site_key: Option<String>,
    captcha_action: String,
}

impl ContactClient {
    /// Client for the configured endpoint
    ///
    /// # Errors
    /// Returns `FolioError::Config` for an invalid endpoint URL.
    pub fn new(config: &FolioConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoints.contact_form)?;
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.endpoints.timeout_seconds))
            .build()
            .map_err(|e| FolioError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            captcha_site_key: config.captcha.site_key.clone().filter(|key| !key.trim().is_empty()),
            captcha_action: config.captcha.action.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Whether a site key is configured, so submissions ask for a token
    pub fn captcha_enabled(&self) -> bool {
        self.captcha_site_key.is_some()
    }

    /// Validate and send `form`
    ///
    /// The provider is only asked for a token when a site key is
    /// configured. A captcha failure is logged and the form goes out without
    /// a token. Returns the endpoint's JSON reply, or `Null` for a non-JSON body.
    ///
    /// # Errors
    /// - `ContactError::Invalid` when validation fails; nothing is sent
    /// - `ContactError::Transport` for transport failures or a non-success
    ///   status
    pub async fn submit(
        &self,
        form: &ContactForm,
        captcha: Option<&dyn CaptchaProvider>,
    ) -> std::result::Result<Value, ContactError> {
        form.validate().map_err(ContactError::Invalid)?;

        let captcha = captcha.filter(|_| self.captcha_enabled());
        let captcha_token = match captcha {
            Some(provider) => match provider.token(&self.captcha_action).await {
                Ok(token) if !token.is_empty() => Some(token),
                Ok(_) => None,
                Err(err) => {
                    warn!(error = %err, "captcha unavailable, sending without token");
                    None
                }
            },
            None => None,
        };

        let submission = Submission {
            name: &form.name,
            email: &form.email,
            message: &form.message,
            captcha_token,
        };
        debug!(url = %self.endpoint, with_token = submission.captcha_token.is_some(), "submitting contact form");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&submission)
            .send()
            .await
            .map_err(FolioError::from)?;
        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.endpoint, %status, "contact form rejected");
            return Err(FolioError::Http {
                status: status.as_u16(),
                url: self.endpoint.to_string(),
            }
            .into());
        }

        let body = response.bytes().await.map_err(FolioError::from)?;
        info!(%status, "contact form sent");
        Ok(serde_json::from_slice(&body).unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for contact.
    use super::*;

    /// Validates the email pattern.
    ///
    /// Assertions:
    /// - Confirms ordinary addresses pass.
    /// - Ensures whitespace, missing `@` or missing dot fail.
    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("jane@example.org"));
        assert!(is_valid_email("a.b+c@sub.example.co"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane example.org"));
        assert!(!is_valid_email("jane @example.org"));
        assert!(!is_valid_email("@example.org"));
    }

    /// Validates per-field results.
    ///
    /// Assertions:
    /// - Confirms whitespace-only values are required errors.
    /// - Confirms a bad address is reported only when present.
    #[test]
    fn test_validate_form() {
        let form = ContactForm::new("  ", "not-an-email", "Hello");
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get(Field::Name), Some(FieldError::Required));
        assert_eq!(errors.get(Field::Email), Some(FieldError::InvalidEmail));
        assert_eq!(errors.get(Field::Message), None);

        let empty = ContactForm::default().validate().unwrap_err();
        assert_eq!(empty.get(Field::Email), Some(FieldError::Required));

        assert!(ContactForm::new("Jane", "jane@example.org", "Hi").validate().is_ok());
    }

    /// Validates message rendering with and without translations.
    ///
    /// Assertions:
    /// - Confirms translated messages are used when available.
    /// - Confirms English defaults otherwise.
    #[test]
    fn test_error_messages() {
        let errors = ContactForm::new("", "x", "m").validate().unwrap_err();
        let messages = errors.messages(|key| (key == "form.required").then(|| "Pflichtfeld".into()));

        assert_eq!(messages[&Field::Name], "Pflichtfeld");
        assert_eq!(messages[&Field::Email], "Please enter a valid email address");
        assert_eq!(errors.to_string(), "name: form.required, email: form.invalidEmail");
    }

    /// Validates the payload shape.
    ///
    /// Assertions:
    /// - Confirms the token key is omitted without a token.
    #[test]
    fn test_submission_payload() {
        let with = serde_json::to_value(Submission {
            name: "Jane",
            email: "jane@example.org",
            message: "Hi",
            captcha_token: Some("tok".into()),
        })
        .unwrap();
        assert_eq!(with["g-recaptcha-response"], "tok");

        let without = serde_json::to_value(Submission {
            name: "Jane",
            email: "jane@example.org",
            message: "Hi",
            captcha_token: None,
        })
        .unwrap();
        assert!(without.get("g-recaptcha-response").is_none());
    }

    /// Validates the captcha step follows the configured site key.
    ///
    /// Assertions:
    /// - Ensures a missing or empty key disables it.
    /// - Confirms a key enables it.
    #[test]
    fn test_captcha_enabled_by_site_key() {
        let mut config = FolioConfig::default();
        assert!(!ContactClient::new(&config).unwrap().captcha_enabled());

        config.captcha.site_key = Some(String::new());
        assert!(!ContactClient::new(&config).unwrap().captcha_enabled());

        config.captcha.site_key = Some("6Lc-site-key".into());
        assert!(ContactClient::new(&config).unwrap().captcha_enabled());
    }
}
