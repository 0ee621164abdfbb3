//! `debug_request`: raw authenticated GET for diagnosing API access

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::SensrClient;
use crate::error::Result;
use crate::mcp::types::McpTool;
use crate::tools::args::{parse_args, require_non_empty};
use crate::tools::{read_only_tool, ToolExecutor};

#[derive(Debug, Deserialize)]
struct DebugRequestArgs {
    path: String,
    #[serde(default)]
    query: Option<BTreeMap<String, String>>,
}

/// Issues an authenticated GET and reports status, headers and a body preview
pub struct DebugRequestTool {
    client: Arc<SensrClient>,
}

impl DebugRequestTool {
    /// Creates the tool bound to `client`
    pub fn new(client: Arc<SensrClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolExecutor for DebugRequestTool {
    fn definition(&self) -> McpTool {
        read_only_tool(
            "debug_request",
            "Send an authenticated GET to any API path and return \
             {status, headers, body_preview} without failing on error statuses.",
            json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "'/v1/...' or 'v1/...'"},
                    "query": {
                        "type": "object",
                        "additionalProperties": {"type": "string"}
                    }
                },
                "required": ["path"]
            }),
        )
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: DebugRequestArgs = parse_args("debug_request", args)?;
        let path = require_non_empty("path", &args.path)?;
        let query: Vec<(String, String)> = args.query.unwrap_or_default().into_iter().collect();
        self.client.debug_request(&path, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_must_be_string_map() {
        let ok: DebugRequestArgs =
            parse_args("debug_request", json!({"path": "v1/sleep", "query": {"a": "1"}})).unwrap();
        assert_eq!(ok.query.unwrap()["a"], "1");

        let bad = parse_args::<DebugRequestArgs>(
            "debug_request",
            json!({"path": "v1/sleep", "query": {"a": 1}}),
        );
        assert!(bad.is_err());
    }
}
