/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint:

- `serve`     -- Run the MCP server on stdin/stdout
- `auth_mode` -- Report which credential mode the environment selects

Both resolve credentials from the environment before doing anything else.
*/

use crate::auth::Credentials;
use crate::config::Config;
use crate::error::Result;

pub mod serve {
    //! Stdio MCP server command

    use super::*;
    use crate::client::SensrClient;
    use crate::mcp::server::{serve_stdio, McpServer};
    use crate::tools::build_registry;
    use std::sync::Arc;

    /// Resolves credentials, wires the client and tools, and serves until EOF
    ///
    /// # Errors
    ///
    /// Returns a configuration error when credentials are missing, before
    /// any input is read
    pub async fn run_serve(config: Config) -> Result<()> {
        let credentials = Credentials::from_env()?;
        tracing::info!(auth_mode = %credentials.mode(), "Resolved Sensr credentials");

        let timezone = config.timezone()?;
        let client = Arc::new(SensrClient::new(&config.api, credentials)?);
        let registry = build_registry(client, timezone);
        let server = Arc::new(McpServer::new(config.server.name.clone(), registry));

        serve_stdio(server).await
    }
}

pub mod auth_mode {
    //! Credential mode reporting

    use super::*;

    /// Exit status when no usable credentials are configured
    pub const EXIT_MISSING_CREDENTIALS: i32 = 2;

    /// Renders the `auth_mode=...` line and the exit status for a resolution
    ///
    /// Never includes secret values.
    ///
    /// # Examples
    ///
    /// ```
    /// use sensorbio_mcp::auth::Credentials;
    /// use sensorbio_mcp::commands::auth_mode::describe;
    ///
    /// let creds = Credentials::OrgToken { value: "secret".to_string() };
    /// assert_eq!(describe(&Ok(creds)), ("auth_mode=org".to_string(), 0));
    /// ```
    pub fn describe(resolved: &Result<Credentials>) -> (String, i32) {
        match resolved {
            Ok(credentials) => (format!("auth_mode={}", credentials.mode()), 0),
            Err(err) => (
                format!("auth_mode=error ({})", err),
                EXIT_MISSING_CREDENTIALS,
            ),
        }
    }

    /// Prints the active mode to stdout and returns the process exit status
    pub fn run_auth_mode() -> i32 {
        let (line, code) = describe(&Credentials::from_env());
        println!("{}", line);
        code
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::auth::OAuthClientCredentials;
        use crate::error::SensrError;

        #[test]
        fn test_describe_oauth() {
            let creds = Credentials::OAuthClient(OAuthClientCredentials {
                client_id: "cid".to_string(),
                client_secret: "hidden".to_string(),
                scope: None,
            });
            let (line, code) = describe(&Ok(creds));
            assert_eq!(line, "auth_mode=oauth");
            assert_eq!(code, 0);
        }

        #[test]
        fn test_describe_error_exits_two() {
            let err = SensrError::Config("missing Sensr credentials".to_string()).into();
            let (line, code) = describe(&Err(err));
            assert!(line.starts_with("auth_mode=error ("));
            assert!(line.contains("missing Sensr credentials"));
            assert_eq!(code, EXIT_MISSING_CREDENTIALS);
        }
    }
}
