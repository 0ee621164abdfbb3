//! Authenticated Sensr API client
//!
//! [`SensrClient`] attaches exactly one `Authorization` header to every
//! request, either `APIKey <org token>` or `Bearer <access token>`, and turns
//! non-2xx responses into [`SensrError::Upstream`] with the status and body
//! preserved verbatim. Successful JSON bodies are returned unmodified.

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::Method;
use serde_json::{json, Map, Value};
use url::Url;

use crate::auth::{AuthMode, Authenticator, Credentials, TokenCache};
use crate::config::ApiConfig;
use crate::error::{Result, SensrError};

/// Query parameters forwarded to the API, in order
pub type Query = Vec<(String, String)>;

/// Response headers kept by [`SensrClient::debug_request`]
const DEBUG_HEADERS: &[&str] = &[
    "server",
    "via",
    "cf-ray",
    "x-request-id",
    "x-amz-cf-id",
    "x-cache",
    "content-type",
    "date",
];

/// Maximum number of body characters returned by [`SensrClient::debug_request`]
const DEBUG_BODY_PREVIEW_CHARS: usize = 1500;

/// Authorization scheme for a Sensr request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// Organization token
    ApiKey,
    /// OAuth2 access token
    Bearer,
}

impl AuthScheme {
    /// Scheme name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::ApiKey => "APIKey",
            AuthScheme::Bearer => "Bearer",
        }
    }
}

/// A computed `Authorization` header; built per request and never stored
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHeader {
    /// Header scheme
    pub scheme: AuthScheme,
    /// Credential value following the scheme
    pub value: String,
}

impl AuthHeader {
    /// `Authorization` header value, e.g. `APIKey abc123`
    ///
    /// # Examples
    ///
    /// ```
    /// use sensorbio_mcp::client::{AuthHeader, AuthScheme};
    ///
    /// let header = AuthHeader { scheme: AuthScheme::ApiKey, value: "abc123".to_string() };
    /// assert_eq!(header.to_header_value(), "APIKey abc123");
    /// ```
    pub fn to_header_value(&self) -> String {
        format!("{} {}", self.scheme.as_str(), self.value)
    }
}

impl fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthHeader")
            .field("scheme", &self.scheme)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// How headers are produced, fixed when the client is built
enum AuthSource {
    OrgToken(String),
    OAuth {
        authenticator: Authenticator,
        cache: TokenCache,
    },
}

/// Client for the Sensr REST API
///
/// One instance is shared by every tool for the life of the process; it
/// owns the process-wide token cache.
///
/// # Examples
///
/// ```no_run
/// use sensorbio_mcp::auth::Credentials;
/// use sensorbio_mcp::client::SensrClient;
/// use sensorbio_mcp::config::ApiConfig;
///
/// # async fn example() -> sensorbio_mcp::error::Result<()> {
/// let credentials = Credentials::from_env()?;
/// let client = SensrClient::new(&ApiConfig::default(), credentials)?;
/// let ids = client.get("/v1/organizations/users/ids", &[]).await?;
/// println!("{ids}");
/// # Ok(())
/// # }
/// ```
pub struct SensrClient {
    http: reqwest::Client,
    base_url: Url,
    mode: AuthMode,
    auth: AuthSource,
}

impl SensrClient {
    /// Builds a client for `config` using the resolved `credentials`
    ///
    /// # Errors
    ///
    /// Returns [`SensrError::Config`] if the base URL does not parse or the
    /// HTTP client cannot be constructed
    pub fn new(config: &ApiConfig, credentials: Credentials) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            SensrError::Config(format!("Invalid api.base_url '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(SensrError::Config(format!(
                "Invalid api.base_url '{}': not a hierarchical URL",
                config.base_url
            ))
            .into());
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("sensorbio-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SensrError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let mode = credentials.mode();
        let auth = match credentials {
            Credentials::OrgToken { value } => AuthSource::OrgToken(value),
            Credentials::OAuthClient(client) => AuthSource::OAuth {
                authenticator: Authenticator::new(http.clone(), config.token_url.clone(), client),
                cache: TokenCache::new(),
            },
        };

        tracing::info!(auth_mode = %mode, base_url = %base_url, "Sensr client ready");

        Ok(Self {
            http,
            base_url,
            mode,
            auth,
        })
    }

    /// The credential mode this client authenticates with
    pub fn auth_mode(&self) -> AuthMode {
        self.mode
    }

    /// The process-wide token cache, present only in OAuth mode
    pub fn token_cache(&self) -> Option<&TokenCache> {
        match &self.auth {
            AuthSource::OrgToken(_) => None,
            AuthSource::OAuth { cache, .. } => Some(cache),
        }
    }

    /// Computes the `Authorization` header for the next request
    ///
    /// Organization-token mode never touches the network. OAuth mode may
    /// perform one token exchange.
    ///
    /// # Errors
    ///
    /// Returns [`SensrError::Authentication`] if a needed exchange fails
    pub async fn auth_header(&self) -> Result<AuthHeader> {
        match &self.auth {
            AuthSource::OrgToken(value) => Ok(AuthHeader {
                scheme: AuthScheme::ApiKey,
                value: value.clone(),
            }),
            AuthSource::OAuth {
                authenticator,
                cache,
            } => Ok(AuthHeader {
                scheme: AuthScheme::Bearer,
                value: authenticator.ensure_valid(cache).await?,
            }),
        }
    }

    /// Sends an authenticated request and returns the parsed JSON body
    ///
    /// An empty success body is returned as `null`.
    ///
    /// # Errors
    ///
    /// - [`SensrError::Authentication`] if no token could be obtained
    /// - [`SensrError::Upstream`] for non-2xx statuses (body verbatim),
    ///   transport failures, timeouts and non-JSON success bodies
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(String, String)]>,
        body: Option<&Value>,
    ) -> Result<Value> {
        let (status, text) = self.execute(method, path, query, body).await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), path, "Sensr API returned an error");
            return Err(SensrError::Upstream {
                status: Some(status.as_u16()),
                body: text,
            }
            .into());
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(path, "Non-JSON response from Sensr API: {}", e);
                Err(SensrError::Upstream {
                    status: Some(status.as_u16()),
                    body: text,
                }
                .into())
            }
        }
    }

    /// Convenience wrapper for an authenticated `GET`
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send)
    pub async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        let query = if query.is_empty() { None } else { Some(query) };
        self.send(Method::GET, path, query, None).await
    }

    /// Authenticated `GET` that reports the raw outcome instead of failing
    ///
    /// Returns `{status, headers, body_preview}` for any HTTP status, keeping
    /// a small set of diagnostic headers and at most 1500 body characters.
    ///
    /// # Errors
    ///
    /// Returns an error only when no token could be obtained or the request
    /// never produced a response
    pub async fn debug_request(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        let query = if query.is_empty() { None } else { Some(query) };

        let response = self.dispatch(Method::GET, path, query, None).await?;
        let status = response.status();
        let headers = pick_debug_headers(response.headers());
        let text = response.text().await.map_err(|e| SensrError::Upstream {
            status: Some(status.as_u16()),
            body: format!("failed to read response body: {e}"),
        })?;

        Ok(json!({
            "status": status.as_u16(),
            "headers": headers,
            "body_preview": preview(&text, DEBUG_BODY_PREVIEW_CHARS),
        }))
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(String, String)]>,
        body: Option<&Value>,
    ) -> Result<(reqwest::StatusCode, String)> {
        let response = self.dispatch(method, path, query, body).await?;
        let status = response.status();
        let text = response.text().await.map_err(|e| SensrError::Upstream {
            status: Some(status.as_u16()),
            body: format!("failed to read response body: {e}"),
        })?;
        Ok((status, text))
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(String, String)]>,
        body: Option<&Value>,
    ) -> Result<reqwest::Response> {
        let url = self.endpoint(path)?;
        let header = self.auth_header().await?;

        tracing::debug!(%method, path, "Sending Sensr API request");

        let mut request = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, header.to_header_value());
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        request.send().await.map_err(|e| {
            SensrError::Upstream {
                status: None,
                body: format!("request to {} failed: {}", path, e),
            }
            .into()
        })
    }

    /// Resolves `path` beneath the base URL
    ///
    /// The path is appended to the base URL's own path, with or without a
    /// leading `/`. The result must keep the base origin and stay under the
    /// base path; anything else is rejected before a header is computed.
    fn endpoint(&self, path: &str) -> Result<Url> {
        let relative = path.trim().trim_start_matches('/');
        let base_path = self.base_url.path().trim_end_matches('/');

        let mut url = self.base_url.clone();
        url.set_path(&format!("{}/{}", base_path, relative));
        url.set_query(None);
        url.set_fragment(None);

        let prefix = format!("{}/", base_path);
        if url.origin() != self.base_url.origin() || !url.path().starts_with(&prefix) {
            tracing::warn!(path, "Rejected request path outside the API base");
            return Err(SensrError::InvalidArguments(format!(
                "request path '{}' resolves outside {}",
                path, self.base_url
            ))
            .into());
        }
        Ok(url)
    }
}

fn pick_debug_headers(headers: &HeaderMap) -> Map<String, Value> {
    DEBUG_HEADERS
        .iter()
        .filter_map(|name| {
            headers
                .get(*name)
                .and_then(|value| value.to_str().ok())
                .map(|value| (name.to_string(), Value::String(value.to_string())))
        })
        .collect()
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
