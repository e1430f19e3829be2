//! Two-tier key/value storage
//!
//! - **Fast tier** ([`local`]): no expiry, megabyte-scale quota. In memory
//!   ([`MemoryStore`]) or persisted to a JSON file ([`FileStore`]).
//! - **Durable tier** ([`cookies`]): small entries that expire after a fixed
//!   number of days ([`CookieJar`]).
//!
//! Both tiers implement [`KeyValueStore`]. Consent-aware routing between them
//! lives in [`crate::compliance`].

pub mod cookies;
pub mod error;
pub mod local;
pub mod traits;

pub use cookies::{
    parse_cookie_header, CookieJar, CookieOptions, DEFAULT_EXPIRATION_DAYS, MAX_COOKIE_BYTES,
};
pub use error::{StorageError, StorageResult};
pub use local::{FileStore, MemoryStore, DEFAULT_QUOTA_BYTES};
pub use traits::KeyValueStore;
