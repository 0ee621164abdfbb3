//! Per-day health record tools: sleep, scores and calories

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::SensrClient;
use crate::error::Result;
use crate::mcp::types::McpTool;
use crate::tools::args::{
    format_date, parse_args, push_param, range_summary, require_non_empty, resolve_date,
    DateRangeArgs, DateSelection, Granularity,
};
use crate::tools::{read_only_tool, ToolExecutor};

#[derive(Debug, Deserialize)]
struct DailyArgs {
    user_id: String,
    #[serde(flatten)]
    range: DateRangeArgs,
}

/// Schema properties for the `date`/`start_date`/`end_date`/`days` inputs
pub(crate) fn date_range_properties() -> Value {
    json!({
        "date": {"type": "string", "format": "date", "description": "YYYY-MM-DD; defaults to today"},
        "start_date": {"type": "string", "format": "date", "description": "Inclusive range start, with end_date"},
        "end_date": {"type": "string", "format": "date", "description": "Inclusive range end, with start_date"},
        "days": {"type": "integer", "minimum": 1, "description": "Last N days ending today"}
    })
}

/// A tool reading one user's per-day records from a fixed endpoint
///
/// A single day returns the upstream body as is. A range (`days` or
/// `start_date`/`end_date`) issues one request per day in order and returns
/// `{range, results: [{date, data}]}` with each body embedded unchanged; the
/// first failing day fails the whole call.
pub struct DailyRecordTool {
    client: Arc<SensrClient>,
    timezone: Tz,
    name: &'static str,
    description: &'static str,
    path: &'static str,
}

impl DailyRecordTool {
    /// `get_sleep` against `/v1/sleep`
    pub fn sleep(client: Arc<SensrClient>, timezone: Tz) -> Self {
        Self {
            client,
            timezone,
            name: "get_sleep",
            description: "Get a user's sleep records. Pass date (defaults to today), \
                          start_date/end_date, or days for the last N days.",
            path: "/v1/sleep",
        }
    }

    /// `get_scores` against `/v1/scores`
    pub fn scores(client: Arc<SensrClient>, timezone: Tz) -> Self {
        Self {
            client,
            timezone,
            name: "get_scores",
            description: "Get a user's daily scores. Pass date (defaults to today), \
                          start_date/end_date, or days for the last N days.",
            path: "/v1/scores",
        }
    }

    async fn fetch_day(&self, user_id: &str, date: NaiveDate) -> Result<Value> {
        let mut query = Vec::new();
        push_param(&mut query, "user_id", user_id);
        push_param(&mut query, "date", format_date(date));
        self.client.get(self.path, &query).await
    }
}

#[async_trait]
impl ToolExecutor for DailyRecordTool {
    fn definition(&self) -> McpTool {
        let mut properties = date_range_properties();
        properties["user_id"] = json!({"type": "string"});
        read_only_tool(
            self.name,
            self.description,
            json!({
                "type": "object",
                "properties": properties,
                "required": ["user_id"]
            }),
        )
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: DailyArgs = parse_args(self.name, args)?;
        let user_id = require_non_empty("user_id", &args.user_id)?;

        match args.range.resolve(self.timezone)? {
            DateSelection::Single(date) => self.fetch_day(&user_id, date).await,
            DateSelection::Range(dates) => {
                tracing::debug!(tool = self.name, days = dates.len(), "Fetching date range");
                let mut results = Vec::with_capacity(dates.len());
                for date in &dates {
                    let data = self.fetch_day(&user_id, *date).await?;
                    results.push(json!({"date": format_date(*date), "data": data}));
                }
                Ok(json!({"range": range_summary(&dates), "results": results}))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct CaloriesArgs {
    user_id: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    granularity: Option<String>,
}

/// `get_calories`: calorie details aggregated by granularity
pub struct CaloriesTool {
    client: Arc<SensrClient>,
    timezone: Tz,
}

impl CaloriesTool {
    /// Creates the tool bound to `client`
    pub fn new(client: Arc<SensrClient>, timezone: Tz) -> Self {
        Self { client, timezone }
    }
}

#[async_trait]
impl ToolExecutor for CaloriesTool {
    fn definition(&self) -> McpTool {
        read_only_tool(
            "get_calories",
            "Get a user's calorie details for a date, aggregated by day, week, month or year.",
            json!({
                "type": "object",
                "properties": {
                    "user_id": {"type": "string"},
                    "date": {"type": "string", "format": "date", "description": "YYYY-MM-DD"},
                    "granularity": {
                        "type": "string",
                        "enum": ["day", "week", "month", "year"],
                        "default": "day"
                    }
                },
                "required": ["user_id"]
            }),
        )
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: CaloriesArgs = parse_args("get_calories", args)?;
        let user_id = require_non_empty("user_id", &args.user_id)?;
        let granularity = match args.granularity.as_deref() {
            Some(raw) => raw.parse::<Granularity>()?,
            None => Granularity::default(),
        };
        let date = resolve_date(args.date.as_deref(), self.timezone)?;

        let mut query = Vec::new();
        push_param(&mut query, "user_id", user_id);
        push_param(&mut query, "date", format_date(date));
        push_param(&mut query, "granularity", granularity);
        self.client.get("/v1/calorie/details", &query).await
    }
}
