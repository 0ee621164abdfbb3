//! Sensr authentication and session handling
//!
//! Every outbound Sensr request carries exactly one `Authorization` header,
//! produced from one of two credential modes:
//!
//! - Organization token: a static key sent as `APIKey <token>`.
//! - OAuth2 client credentials: a short-lived bearer token obtained from the
//!   token endpoint and cached in memory until it nears expiry.
//!
//! # Module Layout
//!
//! - [`credentials`]   -- one-time resolution of the active credential mode
//! - [`token_cache`]   -- the process-wide cached token and its freshness rule
//! - [`authenticator`] -- single-flight client-credentials exchange

pub mod authenticator;
pub mod credentials;
pub mod token_cache;

pub use authenticator::Authenticator;
pub use credentials::{AuthMode, Credentials, OAuthClientCredentials};
pub use token_cache::{CachedToken, TokenCache, TokenState};
