//! Consent decision model
//!
//! The decision and its two sub-flags live in the durable tier as plain
//! strings: `cookies_decision` is `accepted`/`rejected` (unset means
//! undecided) and the flags are `true`/`false`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Durable-tier key names for the consent record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentKeys {
    /// Decision marker
    pub decision: String,
    /// Non-essential storage flag
    pub preferences: String,
    /// Analytics flag
    pub analytics: String,
}

impl Default for ConsentKeys {
    fn default() -> Self {
        Self {
            decision: "cookies_decision".to_string(),
            preferences: "cookies_preferences".to_string(),
            analytics: "cookies_analytics".to_string(),
        }
    }
}

/// The user's answer to the consent banner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentDecision {
    /// No answer recorded yet
    #[default]
    Undecided,
    /// Non-essential storage allowed
    Accepted,
    /// Non-essential storage refused
    Rejected,
}

impl ConsentDecision {
    /// Durable-tier representation; undecided is stored as absence
    pub fn as_stored(self) -> Option<&'static str> {
        match self {
            Self::Undecided => None,
            Self::Accepted => Some("accepted"),
            Self::Rejected => Some("rejected"),
        }
    }

    /// Interpret a durable-tier value, unknown values count as undecided
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    /// Whether a decision has been recorded
    pub fn is_decided(self) -> bool {
        !matches!(self, Self::Undecided)
    }
}

impl fmt::Display for ConsentDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_stored().unwrap_or("undecided"))
    }
}

impl FromStr for ConsentDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "undecided" | "" => Ok(Self::Undecided),
            other => Err(format!("unknown consent decision '{other}'")),
        }
    }
}

/// Decision plus its sub-flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentState {
    /// Recorded decision
    pub decision: ConsentDecision,
    /// Fast tier may hold preferences
    pub preferences_enabled: bool,
    /// Analytics may run
    pub analytics_enabled: bool,
}

impl ConsentState {
    /// Build from the raw durable-tier values
    ///
    /// Storage stays enabled unless the flag is literally `false`; analytics
    /// stays disabled unless it is literally `true`.
    pub fn from_stored(
        decision: Option<&str>,
        preferences: Option<&str>,
        analytics: Option<&str>,
    ) -> Self {
        Self {
            decision: ConsentDecision::from_stored(decision),
            preferences_enabled: preferences != Some("false"),
            analytics_enabled: analytics == Some("true"),
        }
    }

    /// Whether the consent banner should be shown
    pub fn needs_prompt(&self) -> bool {
        !self.decision.is_decided()
    }
}

impl Default for ConsentState {
    fn default() -> Self {
        Self::from_stored(None, None, None)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for compliance::consent.
    use super::*;

    /// Validates decision parsing from stored values.
    ///
    /// Assertions:
    /// - Confirms known values parse.
    /// - Confirms unknown and missing values are undecided.
    #[test]
    fn test_decision_from_stored() {
        assert_eq!(ConsentDecision::from_stored(Some("accepted")), ConsentDecision::Accepted);
        assert_eq!(ConsentDecision::from_stored(Some("rejected")), ConsentDecision::Rejected);
        assert_eq!(ConsentDecision::from_stored(Some("maybe")), ConsentDecision::Undecided);
        assert_eq!(ConsentDecision::from_stored(None), ConsentDecision::Undecided);
        assert_eq!(ConsentDecision::Undecided.as_stored(), None);
    }

    /// Validates flag defaults when nothing is stored.
    ///
    /// Assertions:
    /// - Ensures storage defaults to enabled and analytics to disabled.
    /// - Ensures the banner is needed.
    #[test]
    fn test_state_defaults() {
        let state = ConsentState::default();
        assert!(state.preferences_enabled);
        assert!(!state.analytics_enabled);
        assert!(state.needs_prompt());
    }

    /// Validates flags only flip on exact literals.
    ///
    /// Assertions:
    /// - Ensures `"FALSE"` does not disable storage.
    /// - Ensures `"yes"` does not enable analytics.
    #[test]
    fn test_state_literal_flags() {
        let state = ConsentState::from_stored(Some("accepted"), Some("FALSE"), Some("yes"));
        assert!(state.preferences_enabled);
        assert!(!state.analytics_enabled);
        assert!(!state.needs_prompt());
    }
}
