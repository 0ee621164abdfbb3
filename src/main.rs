//! sensorbio-mcp - Sensr API tools over the Model Context Protocol
//!
//! Main entry point for the sensorbio-mcp server.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sensorbio_mcp::cli::{Cli, Commands};
use sensorbio_mcp::commands;
use sensorbio_mcp::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref(), &cli)?;
    config.validate()?;

    match cli.command() {
        Commands::Serve => commands::serve::run_serve(config).await,
        Commands::AuthMode => {
            let code = commands::auth_mode::run_auth_mode();
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
    }
}

/// Initialize tracing/logging
///
/// Logs always go to stderr: stdout carries the MCP protocol.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "sensorbio_mcp=debug"
    } else {
        "sensorbio_mcp=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();
}
