//! In-memory cache for the OAuth2 access token
//!
//! The cache holds at most one token. It is never written to disk: tokens
//! are short-lived secrets and a restart simply exchanges a new one.
//!
//! Freshness is modelled as [`TokenState`]. A token is usable only while
//! more than [`FRESHNESS_MARGIN_SECS`] remain before `expires_at`, so a
//! request does not reach the API just as its token lapses.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, MutexGuard};

/// Seconds before `expires_at` at which a token stops being handed out
pub const FRESHNESS_MARGIN_SECS: i64 = 60;

/// An access token together with the instant it stops being valid
#[derive(Clone, PartialEq, Eq)]
pub struct CachedToken {
    /// Bearer token issued by the token endpoint
    pub access_token: String,
    /// Instant after which the token must be treated as invalid
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Creates a token expiring at `expires_at`
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Creates a token that expires `expires_in_secs` after `now`
    pub fn expiring_in(
        access_token: impl Into<String>,
        expires_in_secs: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(access_token, now + Duration::seconds(expires_in_secs))
    }

    /// Whether the token is still usable at `now`
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use sensorbio_mcp::auth::token_cache::CachedToken;
    ///
    /// let now = Utc::now();
    /// assert!(CachedToken::expiring_in("tok", 120, now).is_fresh_at(now));
    /// assert!(!CachedToken::expiring_in("tok", 30, now).is_fresh_at(now));
    /// ```
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now > Duration::seconds(FRESHNESS_MARGIN_SECS)
    }
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Freshness of the cache contents at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState<'a> {
    /// No token has been fetched yet
    Absent,
    /// A token exists but is inside the refresh margin or past expiry
    Expired,
    /// A usable access token
    Valid(&'a str),
}

impl<'a> TokenState<'a> {
    /// Classifies the cache slot at `now`
    pub fn evaluate(slot: Option<&'a CachedToken>, now: DateTime<Utc>) -> Self {
        match slot {
            None => TokenState::Absent,
            Some(token) if token.is_fresh_at(now) => TokenState::Valid(&token.access_token),
            Some(_) => TokenState::Expired,
        }
    }

    /// The usable token, if any
    pub fn usable(&self) -> Option<&'a str> {
        match *self {
            TokenState::Valid(token) => Some(token),
            TokenState::Absent | TokenState::Expired => None,
        }
    }
}

/// Process-wide holder of the most recent access token
///
/// The slot lives behind an async mutex. [`get`](Self::get) and
/// [`set`](Self::set) are single operations; the authenticator takes the
/// guard through [`lock`](Self::lock) for its whole check-fetch-store
/// sequence so that concurrent callers wait for one exchange.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache pre-populated with `token`
    pub fn with_token(token: CachedToken) -> Self {
        Self {
            slot: Mutex::new(Some(token)),
        }
    }

    /// Returns a copy of the cached token
    pub async fn get(&self) -> Option<CachedToken> {
        self.slot.lock().await.clone()
    }

    /// Replaces the cached token
    pub async fn set(&self, token: CachedToken) {
        *self.slot.lock().await = Some(token);
    }

    /// Exclusive access to the slot for a check-then-fetch-then-store sequence
    pub(crate) async fn lock(&self) -> MutexGuard<'_, Option<CachedToken>> {
        self.slot.lock().await
    }
}
