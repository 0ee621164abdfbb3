//! Credential mode resolution
//!
//! Credentials are read once from the environment at startup. An
//! organization token always wins over OAuth client credentials; when
//! neither is usable the process must refuse to serve.

use std::fmt;

use crate::error::{Result, SensrError};

/// Organization token variable
pub const ENV_ORG_TOKEN: &str = "SENSR_ORG_TOKEN";

/// Older name for the organization token, read only when [`ENV_ORG_TOKEN`]
/// is unset or empty
pub const ENV_LEGACY_API_KEY: &str = "SENSR_API_KEY";

/// OAuth2 client identifier variable
pub const ENV_CLIENT_ID: &str = "SENSR_CLIENT_ID";

/// OAuth2 client secret variable
pub const ENV_CLIENT_SECRET: &str = "SENSR_CLIENT_SECRET";

/// Optional OAuth2 scope variable
pub const ENV_SCOPE: &str = "SENSR_SCOPE";

/// OAuth2 client-credentials configuration
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthClientCredentials {
    /// Client identifier registered with the Sensr authorization server
    pub client_id: String,
    /// Client secret paired with `client_id`
    pub client_secret: String,
    /// Requested scope, sent only when present
    pub scope: Option<String>,
}

impl fmt::Debug for OAuthClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scope", &self.scope)
            .finish()
    }
}

/// The credential mode selected for this process
///
/// Resolved once and never mutated afterwards.
///
/// # Examples
///
/// ```
/// use sensorbio_mcp::auth::credentials::{AuthMode, Credentials};
///
/// let creds = Credentials::resolve_with(|key| match key {
///     "SENSR_ORG_TOKEN" => Some("abc123".to_string()),
///     _ => None,
/// })
/// .unwrap();
/// assert_eq!(creds.mode(), AuthMode::Org);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Static organization token, sent as `APIKey <value>`
    OrgToken {
        /// The token value
        value: String,
    },
    /// OAuth2 client credentials, exchanged for bearer tokens
    OAuthClient(OAuthClientCredentials),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::OrgToken { .. } => f
                .debug_struct("OrgToken")
                .field("value", &"<redacted>")
                .finish(),
            Credentials::OAuthClient(client) => {
                f.debug_tuple("OAuthClient").field(client).finish()
            }
        }
    }
}

/// Which of the two authentication modes is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Organization token mode
    Org,
    /// OAuth2 client-credentials mode
    OAuth,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Org => write!(f, "org"),
            AuthMode::OAuth => write!(f, "oauth"),
        }
    }
}

impl Credentials {
    /// Resolve credentials from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`SensrError::Config`] when neither an organization token nor
    /// a complete client id/secret pair is present
    pub fn from_env() -> Result<Self> {
        Self::resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve credentials through an arbitrary variable lookup
    ///
    /// Values are trimmed; empty values count as absent.
    ///
    /// # Errors
    ///
    /// Returns [`SensrError::Config`] naming the missing variables
    pub fn resolve_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| -> Option<String> {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = read(ENV_ORG_TOKEN).or_else(|| read(ENV_LEGACY_API_KEY)) {
            return Ok(Credentials::OrgToken { value });
        }

        match (read(ENV_CLIENT_ID), read(ENV_CLIENT_SECRET)) {
            (Some(client_id), Some(client_secret)) => {
                Ok(Credentials::OAuthClient(OAuthClientCredentials {
                    client_id,
                    client_secret,
                    scope: read(ENV_SCOPE),
                }))
            }
            (client_id, client_secret) => {
                let message = match (client_id.is_some(), client_secret.is_some()) {
                    (true, false) => format!(
                        "{} is set but {} is missing",
                        ENV_CLIENT_ID, ENV_CLIENT_SECRET
                    ),
                    (false, true) => format!(
                        "{} is set but {} is missing",
                        ENV_CLIENT_SECRET, ENV_CLIENT_ID
                    ),
                    _ => format!(
                        "missing Sensr credentials: set {} (sent as `Authorization: APIKey <token>`), \
                         or both {} and {}",
                        ENV_ORG_TOKEN, ENV_CLIENT_ID, ENV_CLIENT_SECRET
                    ),
                };
                Err(SensrError::Config(message).into())
            }
        }
    }

    /// The active authentication mode
    pub fn mode(&self) -> AuthMode {
        match self {
            Credentials::OrgToken { .. } => AuthMode::Org,
            Credentials::OAuthClient(_) => AuthMode::OAuth,
        }
    }
}
