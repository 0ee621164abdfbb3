//! OAuth2 client-credentials exchange
//!
//! [`Authenticator::ensure_valid`] returns a usable access token, reusing
//! the cached one while it is fresh and otherwise exchanging the client id
//! and secret at the token endpoint.
//!
//! The cache guard is held from the freshness check until the new token is
//! stored. Concurrent callers that find the cache stale queue on that guard
//! and, once the first exchange lands, read its token instead of starting
//! their own. A failed exchange leaves the cache untouched and the next
//! caller tries again; there is no internal retry.

use chrono::Utc;
use serde::Deserialize;

use crate::auth::credentials::OAuthClientCredentials;
use crate::auth::token_cache::{CachedToken, TokenCache, TokenState};
use crate::error::{Result, SensrError};

/// Upper bound applied to `expires_in` before computing `expires_at`
const MAX_EXPIRES_IN_SECS: u64 = 60 * 60 * 24 * 365;

/// Raw JSON response from the token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    #[serde(default)]
    token_type: Option<String>,
}

/// Performs client-credentials exchanges against one token endpoint
///
/// # Examples
///
/// ```no_run
/// use sensorbio_mcp::auth::{Authenticator, OAuthClientCredentials, TokenCache};
///
/// # async fn example() -> sensorbio_mcp::error::Result<()> {
/// let authenticator = Authenticator::new(
///     reqwest::Client::new(),
///     "https://auth.getsensr.io/token",
///     OAuthClientCredentials {
///         client_id: "client".to_string(),
///         client_secret: "secret".to_string(),
///         scope: None,
///     },
/// );
/// let cache = TokenCache::new();
/// let token = authenticator.ensure_valid(&cache).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Authenticator {
    http: reqwest::Client,
    token_url: String,
    credentials: OAuthClientCredentials,
}

impl Authenticator {
    /// Creates an authenticator posting to `token_url`
    ///
    /// The timeout configured on `http` bounds every exchange.
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        credentials: OAuthClientCredentials,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            credentials,
        }
    }

    /// The token endpoint this authenticator posts to
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Returns an access token with more than the freshness margin left
    ///
    /// # Errors
    ///
    /// Returns [`SensrError::Authentication`] when an exchange was needed
    /// and failed; the cache is left as it was.
    pub async fn ensure_valid(&self, cache: &TokenCache) -> Result<String> {
        let mut slot = cache.lock().await;

        match TokenState::evaluate(slot.as_ref(), Utc::now()) {
            TokenState::Valid(token) => return Ok(token.to_string()),
            TokenState::Absent => {
                tracing::debug!("No cached Sensr token, exchanging client credentials");
            }
            TokenState::Expired => {
                tracing::debug!("Cached Sensr token is expiring, exchanging client credentials");
            }
        }

        let fresh = self.exchange().await?;
        let access_token = fresh.access_token.clone();
        *slot = Some(fresh);
        Ok(access_token)
    }

    /// Performs one client-credentials exchange without touching any cache
    ///
    /// # Errors
    ///
    /// Returns [`SensrError::Authentication`] carrying the status and body
    /// for non-2xx responses and malformed bodies, or no status for
    /// transport failures and timeouts.
    pub async fn exchange(&self) -> Result<CachedToken> {
        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];
        if let Some(scope) = self.credentials.scope.as_deref() {
            form.push(("scope", scope));
        }

        let resp = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| SensrError::Authentication {
                status: None,
                body: format!("token request failed: {e}"),
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| SensrError::Authentication {
            status: Some(status.as_u16()),
            body: format!("failed to read token response: {e}"),
        })?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Sensr token endpoint rejected the exchange");
            return Err(SensrError::Authentication {
                status: Some(status.as_u16()),
                body,
            }
            .into());
        }

        let parsed: TokenResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Malformed Sensr token response: {}", e);
                return Err(SensrError::Authentication {
                    status: Some(status.as_u16()),
                    body,
                }
                .into());
            }
        };

        if parsed.access_token.is_empty() {
            tracing::warn!("Sensr token response carried an empty access_token");
            return Err(SensrError::Authentication {
                status: Some(status.as_u16()),
                body,
            }
            .into());
        }

        if let Some(token_type) = parsed.token_type.as_deref() {
            if !token_type.eq_ignore_ascii_case("bearer") {
                tracing::debug!("Unexpected token_type '{}', sending as Bearer", token_type);
            }
        }

        let expires_in = parsed.expires_in.min(MAX_EXPIRES_IN_SECS) as i64;
        tracing::info!(expires_in, "Obtained Sensr access token");
        Ok(CachedToken::expiring_in(
            parsed.access_token,
            expires_in,
            Utc::now(),
        ))
    }
}
