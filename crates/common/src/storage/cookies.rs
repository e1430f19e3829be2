//! Durable tier: an expiring cookie jar
//!
//! Values are percent-encoded on the way in and decoded on the way out.
//! Every write stamps the entry with `expires = now + expiration_days`;
//! expired entries read as missing and are pruned on the next access.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;

use super::error::{StorageError, StorageResult};
use super::traits::KeyValueStore;
use crate::error::CommonError;
use crate::time::{Clock, SystemClock};

/// Largest `name=value` pair a single cookie may carry
pub const MAX_COOKIE_BYTES: usize = 4096;

/// Days a cookie lives unless configured otherwise
pub const DEFAULT_EXPIRATION_DAYS: u32 = 1;

/// Attributes applied to every cookie written by a [`CookieJar`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    /// Lifetime of each write, in days
    pub expiration_days: u32,
    /// Cookie path attribute
    pub path: String,
    /// `SameSite` attribute
    pub same_site: String,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            expiration_days: DEFAULT_EXPIRATION_DAYS,
            path: "/".to_string(),
            same_site: "Lax".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Cookie {
    encoded: String,
    expires: DateTime<Utc>,
}

/// In-process cookie jar implementing the durable tier
#[derive(Debug)]
pub struct CookieJar<C: Clock = SystemClock> {
    cookies: Mutex<BTreeMap<String, Cookie>>,
    options: CookieOptions,
    clock: C,
}

impl CookieJar<SystemClock> {
    /// Jar with default options on the system clock
    pub fn new() -> Self {
        Self::with_clock(CookieOptions::default(), SystemClock)
    }

    /// Jar with custom options on the system clock
    pub fn with_options(options: CookieOptions) -> Self {
        Self::with_clock(options, SystemClock)
    }
}

impl Default for CookieJar<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> CookieJar<C> {
    /// Jar reading expiry time from `clock`
    pub fn with_clock(options: CookieOptions, clock: C) -> Self {
        Self { cookies: Mutex::new(BTreeMap::new()), options, clock }
    }

    /// Attributes used for writes
    pub fn options(&self) -> &CookieOptions {
        &self.options
    }

    fn validate_name(name: &str) -> StorageResult<()> {
        let invalid = name.is_empty()
            || name.chars().any(|c| c.is_whitespace() || c.is_control() || "=;,".contains(c));
        if invalid {
            return Err(StorageError::InvalidKey(name.to_string()));
        }
        Ok(())
    }

    fn expiry_from_now(&self) -> StorageResult<DateTime<Utc>> {
        let days = self.options.expiration_days;
        TimeDelta::try_days(i64::from(days))
            .and_then(|ttl| self.clock.utc_now().checked_add_signed(ttl))
            .ok_or_else(|| {
                CommonError::config_field(
                    "cookies.expiration_days",
                    format!("{days} days puts the expiry out of range"),
                )
                .into()
            })
    }

    fn prune(&self, cookies: &mut BTreeMap<String, Cookie>) {
        let now = self.clock.utc_now();
        cookies.retain(|_, cookie| cookie.expires > now);
    }

    /// Expiry instant of a live cookie
    pub fn expires_at(&self, name: &str) -> Option<DateTime<Utc>> {
        let mut cookies = self.cookies.lock();
        self.prune(&mut cookies);
        cookies.get(name).map(|cookie| cookie.expires)
    }

    /// `Set-Cookie` style line for a live cookie
    ///
    /// `name=value; expires=Tue, 02 Jan 2024 10:00:00 GMT; path=/; SameSite=Lax`
    pub fn set_cookie_string(&self, name: &str) -> Option<String> {
        let mut cookies = self.cookies.lock();
        self.prune(&mut cookies);
        cookies.get(name).map(|cookie| {
            format!(
                "{}={}; expires={}; path={}; SameSite={}",
                name,
                cookie.encoded,
                cookie.expires.format("%a, %d %b %Y %H:%M:%S GMT"),
                self.options.path,
                self.options.same_site
            )
        })
    }

    /// Request-side `Cookie` header carrying every live cookie
    pub fn cookie_header(&self) -> String {
        let mut cookies = self.cookies.lock();
        self.prune(&mut cookies);
        cookies
            .iter()
            .map(|(name, cookie)| format!("{}={}", name, cookie.encoded))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Store every pair from a `Cookie` header with a fresh expiry
    ///
    /// # Errors
    ///
    /// Stops at the first pair that cannot be stored.
    pub fn import_header(&self, header: &str) -> StorageResult<usize> {
        let pairs = parse_cookie_header(header);
        for (name, value) in &pairs {
            self.set(name, value)?;
        }
        Ok(pairs.len())
    }
}

impl<C: Clock> KeyValueStore for CookieJar<C> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let mut cookies = self.cookies.lock();
        self.prune(&mut cookies);
        cookies
            .get(key)
            .map(|cookie| {
                urlencoding::decode(&cookie.encoded).map(|value| value.into_owned()).map_err(
                    |err| StorageError::Corrupt { key: key.to_string(), reason: err.to_string() },
                )
            })
            .transpose()
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        Self::validate_name(key)?;
        let encoded = urlencoding::encode(value).into_owned();
        let size = key.len() + 1 + encoded.len();
        if size > MAX_COOKIE_BYTES {
            return Err(StorageError::EntryTooLarge {
                key: key.to_string(),
                size,
                limit: MAX_COOKIE_BYTES,
            });
        }

        let expires = self.expiry_from_now()?;
        let mut cookies = self.cookies.lock();
        self.prune(&mut cookies);
        cookies.insert(key.to_string(), Cookie { encoded, expires });
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.cookies.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let mut cookies = self.cookies.lock();
        self.prune(&mut cookies);
        Ok(cookies.keys().cloned().collect())
    }

    fn clear(&self) -> StorageResult<()> {
        self.cookies.lock().clear();
        Ok(())
    }
}

/// Split a `Cookie` header into decoded `(name, value)` pairs
///
/// Segments without `=` or with an empty name are skipped. Values that fail
/// to decode are kept verbatim.
pub fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|segment| {
            let (name, value) = segment.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = urlencoding::decode(value.trim())
                .map_or_else(|_| value.trim().to_string(), |decoded| decoded.into_owned());
            Some((name.to_string(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    //! Unit tests for storage::cookies.
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;
    use crate::time::MockClock;

    fn jar(clock: &MockClock) -> CookieJar<MockClock> {
        CookieJar::with_clock(CookieOptions::default(), clock.clone())
    }

    /// Validates values are percent-encoded at rest and decoded on read.
    ///
    /// Assertions:
    /// - Confirms the read value equals the written value.
    /// - Confirms the header carries the encoded form.
    #[test]
    fn test_cookie_encoding() {
        let clock = MockClock::new();
        let jar = jar(&clock);
        jar.set("note", "a b;c=d").unwrap();

        assert_eq!(jar.get("note").unwrap().as_deref(), Some("a b;c=d"));
        assert_eq!(jar.cookie_header(), "note=a%20b%3Bc%3Dd");
    }

    /// Validates cookies expire after the configured number of days.
    ///
    /// Assertions:
    /// - Confirms the value is visible just before expiry.
    /// - Confirms it is gone at expiry.
    #[test]
    fn test_cookie_expiry() {
        let clock = MockClock::new();
        let jar = jar(&clock);
        jar.set("cookies_decision", "accepted").unwrap();

        clock.advance(Duration::from_secs(24 * 60 * 60 - 1));
        assert!(jar.contains("cookies_decision").unwrap());

        clock.advance(Duration::from_secs(1));
        assert_eq!(jar.get("cookies_decision").unwrap(), None);
        assert!(jar.keys().unwrap().is_empty());
    }

    /// Validates rewriting a cookie refreshes its expiry.
    ///
    /// Assertions:
    /// - Confirms the cookie outlives its original expiry.
    #[test]
    fn test_cookie_rewrite_refreshes_expiry() {
        let clock = MockClock::new();
        let jar = jar(&clock);
        jar.set("theme", "dark").unwrap();

        clock.advance(Duration::from_secs(12 * 60 * 60));
        jar.set("theme", "light").unwrap();
        clock.advance(Duration::from_secs(18 * 60 * 60));

        assert_eq!(jar.get("theme").unwrap().as_deref(), Some("light"));
    }

    /// Validates the per-cookie size limit.
    ///
    /// Assertions:
    /// - Ensures an oversized value fails with `EntryTooLarge`.
    #[test]
    fn test_cookie_size_limit() {
        let clock = MockClock::new();
        let jar = jar(&clock);
        let value = "x".repeat(MAX_COOKIE_BYTES);

        assert!(matches!(jar.set("big", &value), Err(StorageError::EntryTooLarge { .. })));
    }

    /// Validates an unrepresentable lifetime fails the write instead of panicking.
    ///
    /// Assertions:
    /// - Ensures a `Config` error naming the option.
    /// - Confirms nothing is stored.
    #[test]
    fn test_cookie_expiry_out_of_range() {
        let options = CookieOptions { expiration_days: u32::MAX, ..CookieOptions::default() };
        let jar = CookieJar::with_clock(options, MockClock::new());

        let err = jar.set("theme", "dark").unwrap_err();
        assert!(matches!(
            err,
            StorageError::Common(CommonError::Config { ref field, .. })
                if field.as_deref() == Some("cookies.expiration_days")
        ));
        assert!(jar.keys().unwrap().is_empty());
    }

    /// Validates cookie names with separators are rejected.
    ///
    /// Assertions:
    /// - Ensures `InvalidKey` for names containing `=` or `;`.
    #[test]
    fn test_cookie_invalid_names() {
        let clock = MockClock::new();
        let jar = jar(&clock);

        assert!(matches!(jar.set("a=b", "1"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(jar.set("a;b", "1"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(jar.set("", "1"), Err(StorageError::InvalidKey(_))));
    }

    /// Validates the `Set-Cookie` rendering.
    ///
    /// Assertions:
    /// - Confirms expiry, path and `SameSite` attributes.
    #[test]
    fn test_set_cookie_string() {
        let clock = MockClock::starting_at(UNIX_EPOCH);
        let jar = jar(&clock);
        jar.set("language", "ru").unwrap();

        assert_eq!(
            jar.set_cookie_string("language").as_deref(),
            Some("language=ru; expires=Fri, 02 Jan 1970 00:00:00 GMT; path=/; SameSite=Lax")
        );
        assert_eq!(jar.set_cookie_string("missing"), None);
    }

    /// Validates header parsing and import.
    ///
    /// Assertions:
    /// - Confirms malformed segments are skipped.
    /// - Confirms imported values decode.
    #[test]
    fn test_parse_and_import_header() {
        let pairs = parse_cookie_header(" theme=dark; broken; =x; note=a%20b ");
        assert_eq!(
            pairs,
            vec![("theme".to_string(), "dark".to_string()), ("note".to_string(), "a b".to_string())]
        );

        let clock = MockClock::new();
        let jar = jar(&clock);
        assert_eq!(jar.import_header("theme=dark; note=a%20b").unwrap(), 2);
        assert_eq!(jar.get("note").unwrap().as_deref(), Some("a b"));
    }
}
