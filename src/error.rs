//! Error types for sensorbio-mcp
//!
//! This module defines the error taxonomy shared by the authentication core,
//! the Sensr API client and the tool layer, using `thiserror` for ergonomic
//! error handling.

use thiserror::Error;

/// Main error type for sensorbio-mcp operations
///
/// Functions return [`Result`] (an `anyhow::Result`) whose error wraps one of
/// these variants. Callers that need to branch on the failure kind use
/// `err.downcast_ref::<SensrError>()`.
#[derive(Error, Debug)]
pub enum SensrError {
    /// Missing or invalid configuration, including unresolvable credentials.
    ///
    /// Fatal at startup: the server must not serve tool calls.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The OAuth2 token exchange failed, timed out, or returned a malformed body
    #[error("Authentication error (status {}): {body}", status_label(.status))]
    Authentication {
        /// HTTP status returned by the token endpoint, if a response arrived
        status: Option<u16>,
        /// Response body, or the transport failure description
        body: String,
    },

    /// The Sensr API answered with a non-2xx status or could not be reached
    #[error("Upstream error (status {}): {body}", status_label(.status))]
    Upstream {
        /// HTTP status returned by the API, if a response arrived
        status: Option<u16>,
        /// Response body verbatim, or the transport failure description
        body: String,
    },

    /// Tool arguments failed validation before any request was made
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A tool name that is not registered
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SensrError {
    /// HTTP status carried by authentication and upstream failures
    pub fn status(&self) -> Option<u16> {
        match self {
            SensrError::Authentication { status, .. } | SensrError::Upstream { status, .. } => {
                *status
            }
            _ => None,
        }
    }

    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            SensrError::Config(_) => "configuration",
            SensrError::Authentication { .. } => "authentication",
            SensrError::Upstream { .. } => "upstream",
            SensrError::InvalidArguments(_) => "invalid_arguments",
            SensrError::UnknownTool(_) => "unknown_tool",
            SensrError::Io(_) => "io",
            SensrError::Serialization(_) => "serialization",
            SensrError::Yaml(_) => "yaml",
        }
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}

/// Result type alias for sensorbio-mcp operations
///
/// Uses `anyhow::Error` so that context can be attached while the
/// underlying [`SensrError`] stays reachable through `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;
