//! sensorbio-mcp - Sensr API tools over the Model Context Protocol
//!
//! This library provides the authentication core for the Sensr REST API and
//! the MCP server that exposes Sensr read operations as tools.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: Credential resolution, token cache, and OAuth2 client-credentials exchange
//! - `client`: Authenticated Sensr HTTP client
//! - `tools`: Tool definitions and registry
//! - `mcp`: JSON-RPC 2.0 MCP server over stdio
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface and handlers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sensorbio_mcp::{Config, Credentials, SensrClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let client = Arc::new(SensrClient::new(&config.api, Credentials::from_env()?)?);
//!     let ids = client.get("/v1/organizations/users/ids", &[]).await?;
//!     println!("{ids}");
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod mcp;
pub mod tools;

// Re-export commonly used types
pub use auth::{AuthMode, Authenticator, CachedToken, Credentials, TokenCache, TokenState};
pub use client::{AuthHeader, AuthScheme, SensrClient};
pub use config::Config;
pub use error::{Result, SensrError};
pub use mcp::McpServer;
pub use tools::{build_registry, ToolExecutor, ToolRegistry};
