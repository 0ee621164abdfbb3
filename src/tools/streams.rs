//! Cursor-paged time-series tools: activities and biometrics

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::SensrClient;
use crate::error::{Result, SensrError};
use crate::mcp::types::McpTool;
use crate::tools::args::{
    format_date, non_blank, parse_args, parse_date, push_param, require_non_empty,
};
use crate::tools::{read_only_tool, ToolExecutor};

fn default_limit() -> u32 {
    50
}

#[derive(Debug, Deserialize)]
struct TimeSeriesArgs {
    user_id: String,
    #[serde(default)]
    last_timestamp: Option<i64>,
    #[serde(default)]
    start_timestamp_ms: Option<i64>,
    #[serde(default)]
    end_timestamp_ms: Option<i64>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    cursor: Option<String>,
}

/// A tool reading a user's records newer than a timestamp, page by page
///
/// `last-timestamp` is always sent: `last_timestamp`, else
/// `start_timestamp_ms`, else 0. The optional `end-timestamp`, `start-date`
/// and `end-date` filters are forwarded only when given.
pub struct TimeSeriesTool {
    client: Arc<SensrClient>,
    name: &'static str,
    description: &'static str,
    path: &'static str,
}

impl TimeSeriesTool {
    /// `get_activities` against `/v1/activities`
    pub fn activities(client: Arc<SensrClient>) -> Self {
        Self {
            client,
            name: "get_activities",
            description: "Get a user's activities recorded after last_timestamp (ms). \
                          Optional start/end timestamps (ms) and start/end dates narrow \
                          the window. Pass the cursor from a previous page to continue.",
            path: "/v1/activities",
        }
    }

    /// `get_biometrics` against `/v1/biometrics`
    pub fn biometrics(client: Arc<SensrClient>) -> Self {
        Self {
            client,
            name: "get_biometrics",
            description: "Get a user's biometric samples recorded after last_timestamp (ms). \
                          Optional start/end timestamps (ms) and start/end dates narrow \
                          the window. Pass the cursor from a previous page to continue.",
            path: "/v1/biometrics",
        }
    }

    fn query(args: TimeSeriesArgs) -> Result<Vec<(String, String)>> {
        let user_id = require_non_empty("user_id", &args.user_id)?;

        let start_date = non_blank(args.start_date.as_deref())
            .map(|raw| parse_date("start_date", raw))
            .transpose()?;
        let end_date = non_blank(args.end_date.as_deref())
            .map(|raw| parse_date("end_date", raw))
            .transpose()?;
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                return Err(SensrError::InvalidArguments(format!(
                    "end_date {} must not be before start_date {}",
                    end, start
                ))
                .into());
            }
        }
        let last_timestamp = args.last_timestamp.or(args.start_timestamp_ms).unwrap_or(0);

        let mut query = Vec::new();
        push_param(&mut query, "user_id", user_id);
        push_param(&mut query, "limit", args.limit);
        push_param(&mut query, "last-timestamp", last_timestamp);
        if let Some(cursor) = non_blank(args.cursor.as_deref()) {
            push_param(&mut query, "cursor", cursor);
        }
        if let Some(end) = args.end_timestamp_ms {
            push_param(&mut query, "end-timestamp", end);
        }
        if let Some(start) = start_date {
            push_param(&mut query, "start-date", format_date(start));
        }
        if let Some(end) = end_date {
            push_param(&mut query, "end-date", format_date(end));
        }
        Ok(query)
    }
}

#[async_trait]
impl ToolExecutor for TimeSeriesTool {
    fn definition(&self) -> McpTool {
        read_only_tool(
            self.name,
            self.description,
            json!({
                "type": "object",
                "properties": {
                    "user_id": {"type": "string"},
                    "last_timestamp": {"type": "integer", "default": 0, "description": "Epoch milliseconds"},
                    "start_timestamp_ms": {"type": "integer", "description": "Used as last_timestamp when that is absent"},
                    "end_timestamp_ms": {"type": "integer", "description": "Epoch milliseconds"},
                    "start_date": {"type": "string", "format": "date", "description": "YYYY-MM-DD"},
                    "end_date": {"type": "string", "format": "date", "description": "YYYY-MM-DD"},
                    "limit": {"type": "integer", "minimum": 1, "default": 50},
                    "cursor": {"type": "string"}
                },
                "required": ["user_id"]
            }),
        )
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: TimeSeriesArgs = parse_args(self.name, args)?;
        let query = Self::query(args)?;
        self.client.get(self.path, &query).await
    }
}
