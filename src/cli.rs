//! Command-line interface definition for sensorbio-mcp
//!
//! This module defines the CLI structure using clap's derive API.
//! Running the binary without a subcommand starts the stdio MCP server.

use clap::{Parser, Subcommand};

/// sensorbio-mcp - Sensr API tools over the Model Context Protocol
///
/// Serves Sensr read operations as MCP tools on stdin/stdout.
/// Credentials come from SENSR_ORG_TOKEN, or SENSR_CLIENT_ID and
/// SENSR_CLIENT_SECRET (with optional SENSR_SCOPE).
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "sensorbio-mcp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to an optional YAML configuration file
    #[arg(short, long, env = "SENSORBIO_MCP_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose logging (written to stderr)
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the Sensr API base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Command to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for sensorbio-mcp
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the MCP server over stdio
    Serve,

    /// Print which authentication mode the environment selects, without secrets
    AuthMode,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The command to run, falling back to `serve`
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["sensorbio-mcp"]).unwrap();
        assert_eq!(cli.command(), Commands::Serve);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_auth_mode_subcommand() {
        let cli = Cli::try_parse_from(["sensorbio-mcp", "auth-mode"]).unwrap();
        assert_eq!(cli.command(), Commands::AuthMode);
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "sensorbio-mcp",
            "--verbose",
            "--config",
            "sensr.yaml",
            "--base-url",
            "http://localhost:9000",
            "serve",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some("sensr.yaml"));
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(cli.command(), Commands::Serve);
    }
}
