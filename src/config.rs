//! Configuration management for sensorbio-mcp
//!
//! Settings come from an optional YAML file, then environment variables,
//! then CLI overrides. Credentials are deliberately not part of this
//! structure; they are resolved from the environment by
//! [`crate::auth::credentials`].

use crate::error::{Result, SensrError};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default Sensr API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.getsensr.io";

/// Default OAuth2 token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://auth.getsensr.io/token";

/// Main configuration structure for sensorbio-mcp
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Upstream API and token endpoint settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Tool layer settings
    #[serde(default)]
    pub tools: ToolsConfig,
    /// MCP server identity
    #[serde(default)]
    pub server: ServerConfig,
}

/// Upstream endpoints and HTTP behavior
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Base URL for every Sensr API call
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// OAuth2 client-credentials token endpoint
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Timeout applied to each outbound HTTP request
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_url: default_token_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Tool layer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolsConfig {
    /// IANA timezone used to compute "today" when a date argument is omitted
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "America/Chicago".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

/// Identity reported to MCP clients during `initialize`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Server name in `serverInfo`
    #[serde(default = "default_server_name")]
    pub name: String,
}

fn default_server_name() -> String {
    "sensorbio".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged. When no path is given at all, defaults are used silently.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: Option<&str>, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = match path {
            Some(path) if Path::new(path).exists() => Self::from_file(path)?,
            Some(path) => {
                tracing::warn!("Config file not found at {}, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SensrError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| SensrError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("SENSR_BASE_URL") {
            if !base_url.trim().is_empty() {
                self.api.base_url = base_url.trim().to_string();
            }
        }

        if let Ok(token_url) = std::env::var("SENSR_TOKEN_URL") {
            if !token_url.trim().is_empty() {
                self.api.token_url = token_url.trim().to_string();
            }
        }

        if let Ok(timeout) = std::env::var("SENSR_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.trim().parse() {
                self.api.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid SENSR_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(tz) = std::env::var("SENSR_TZ") {
            if !tz.trim().is_empty() {
                self.tools.timezone = tz.trim().to_string();
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(base_url) = &cli.base_url {
            self.api.base_url = base_url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`SensrError::Config`] if any URL does not parse, the timeout
    /// is zero, or the timezone name is unknown
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.base_url).map_err(|e| {
            SensrError::Config(format!("Invalid api.base_url '{}': {}", self.api.base_url, e))
        })?;

        url::Url::parse(&self.api.token_url).map_err(|e| {
            SensrError::Config(format!(
                "Invalid api.token_url '{}': {}",
                self.api.token_url, e
            ))
        })?;

        if self.api.timeout_seconds == 0 {
            return Err(SensrError::Config(
                "api.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        self.timezone()?;

        if self.server.name.trim().is_empty() {
            return Err(SensrError::Config("server.name cannot be empty".to_string()).into());
        }

        Ok(())
    }

    /// Parsed tool timezone
    ///
    /// # Errors
    ///
    /// Returns [`SensrError::Config`] for names outside the IANA database
    pub fn timezone(&self) -> Result<Tz> {
        self.tools.timezone.parse::<Tz>().map_err(|_| {
            SensrError::Config(format!("Unknown timezone: {}", self.tools.timezone)).into()
        })
    }
}
