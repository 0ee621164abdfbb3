//! Organization-wide per-day summaries: sleep and scores for every user

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::client::SensrClient;
use crate::error::{Result, SensrError};
use crate::mcp::server::error_payload;
use crate::mcp::types::McpTool;
use crate::tools::args::{format_date, parse_args, push_param, range_summary, DateRangeArgs};
use crate::tools::health::date_range_properties;
use crate::tools::users::USER_IDS_PATH;
use crate::tools::{read_only_tool, ToolExecutor};

/// Upper bound on `max_users`
pub const MAX_USERS: u32 = 500;

/// Upper bound on `concurrency`
pub const MAX_CONCURRENCY: u32 = 10;

fn default_max_users() -> u32 {
    50
}

fn default_concurrency() -> u32 {
    3
}

#[derive(Debug, Deserialize)]
struct OrgSummaryArgs {
    #[serde(flatten)]
    range: DateRangeArgs,
    #[serde(default = "default_max_users")]
    max_users: u32,
    #[serde(default = "default_concurrency")]
    concurrency: u32,
}

/// Fetches one endpoint for every organization user over a date range
///
/// Users come from the organization id list, truncated to `max_users`, and
/// are fetched at most `concurrency` at a time. A failed day is recorded in
/// `errors` and does not fail the call; failing to list the users does.
pub struct OrgSummaryTool {
    client: Arc<SensrClient>,
    timezone: Tz,
    name: &'static str,
    description: &'static str,
    path: &'static str,
}

impl OrgSummaryTool {
    /// `get_org_sleep_summary` over `/v1/sleep`
    pub fn sleep(client: Arc<SensrClient>, timezone: Tz) -> Self {
        Self {
            client,
            timezone,
            name: "get_org_sleep_summary",
            description: "Get sleep records for every organization user over a date, \
                          start_date/end_date range, or the last N days.",
            path: "/v1/sleep",
        }
    }

    /// `get_org_scores_summary` over `/v1/scores`
    pub fn scores(client: Arc<SensrClient>, timezone: Tz) -> Self {
        Self {
            client,
            timezone,
            name: "get_org_scores_summary",
            description: "Get daily scores for every organization user over a date, \
                          start_date/end_date range, or the last N days.",
            path: "/v1/scores",
        }
    }

    async fn user_ids(&self, max_users: usize) -> Result<Vec<String>> {
        let body = self.client.get(USER_IDS_PATH, &[]).await?;
        let ids = parse_user_ids(&body).ok_or_else(|| SensrError::Upstream {
            status: Some(200),
            body: format!("unexpected user id list shape: {}", body),
        })?;
        Ok(ids.into_iter().take(max_users).collect())
    }
}

/// Reads `user_ids` (or `ids`) as strings; numeric ids are stringified
fn parse_user_ids(body: &Value) -> Option<Vec<String>> {
    let list = body
        .get("user_ids")
        .or_else(|| body.get("ids"))?
        .as_array()?;
    list.iter()
        .map(|id| match id {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

fn bounded(field: &str, value: u32, max: u32) -> Result<u32> {
    if value == 0 {
        return Err(SensrError::InvalidArguments(format!("{} must be >= 1", field)).into());
    }
    Ok(value.min(max))
}

struct UserDays {
    user: Value,
    errors: Vec<Value>,
}

async fn fetch_user(
    client: Arc<SensrClient>,
    tool: &'static str,
    path: &'static str,
    user_id: String,
    dates: Arc<Vec<NaiveDate>>,
) -> UserDays {
    let mut days = Vec::with_capacity(dates.len());
    let mut fetched = Vec::with_capacity(dates.len());
    let mut errors = Vec::new();

    for date in dates.iter() {
        let mut query = Vec::new();
        push_param(&mut query, "user_id", &user_id);
        push_param(&mut query, "date", format_date(*date));
        match client.get(path, &query).await {
            Ok(data) => {
                days.push(json!({"date": format_date(*date), "data": data}));
                fetched.push(*date);
            }
            Err(err) => {
                tracing::warn!(tool, user_id = %user_id, %date, "Per-day fetch failed: {:#}", err);
                let mut payload = error_payload(tool, &err);
                let mut detail = payload["error"].take();
                detail["user_id"] = json!(user_id);
                detail["date"] = json!(format_date(*date));
                errors.push(detail);
            }
        }
    }

    let mut summary = range_summary(&fetched);
    if let Some(map) = summary.as_object_mut() {
        map.remove("dates");
    }
    UserDays {
        user: json!({"user_id": user_id, "days": days, "summary": summary}),
        errors,
    }
}

#[async_trait]
impl ToolExecutor for OrgSummaryTool {
    fn definition(&self) -> McpTool {
        let mut properties = date_range_properties();
        properties["max_users"] = json!({
            "type": "integer", "minimum": 1, "maximum": MAX_USERS, "default": 50
        });
        properties["concurrency"] = json!({
            "type": "integer", "minimum": 1, "maximum": MAX_CONCURRENCY, "default": 3
        });
        read_only_tool(
            self.name,
            self.description,
            json!({"type": "object", "properties": properties}),
        )
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: OrgSummaryArgs = parse_args(self.name, args)?;
        let dates = Arc::new(args.range.resolve(self.timezone)?.into_dates());
        let max_users = bounded("max_users", args.max_users, MAX_USERS)?;
        let concurrency = bounded("concurrency", args.concurrency, MAX_CONCURRENCY)?;

        let ids = self.user_ids(max_users as usize).await?;
        tracing::debug!(
            tool = self.name,
            users = ids.len(),
            days = dates.len(),
            concurrency,
            "Fetching organization summary"
        );

        let semaphore = Arc::new(Semaphore::new(concurrency as usize));
        let mut tasks = JoinSet::new();
        for (index, user_id) in ids.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            let client = self.client.clone();
            let dates = dates.clone();
            let (tool, path) = (self.name, self.path);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                (index, fetch_user(client, tool, path, user_id, dates).await)
            });
        }

        let mut users = Vec::new();
        let mut errors = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    users.push((index, outcome.user));
                    errors.extend(outcome.errors);
                }
                Err(err) => {
                    tracing::error!(tool = self.name, "User fetch task failed: {}", err);
                    errors.push(json!({
                        "tool": self.name,
                        "kind": "internal",
                        "message": format!("user fetch task failed: {}", err),
                    }));
                }
            }
        }
        users.sort_by_key(|(index, _)| *index);

        Ok(json!({
            "range": range_summary(&dates),
            "users": users.into_iter().map(|(_, user)| user).collect::<Vec<_>>(),
            "errors": errors,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use crate::config::ApiConfig;

    fn offline_client() -> Arc<SensrClient> {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..ApiConfig::default()
        };
        Arc::new(
            SensrClient::new(
                &config,
                Credentials::OrgToken {
                    value: "abc123".to_string(),
                },
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_parse_user_ids_accepts_both_keys() {
        assert_eq!(
            parse_user_ids(&json!({"user_ids": ["u1", 42]})),
            Some(vec!["u1".to_string(), "42".to_string()])
        );
        assert_eq!(
            parse_user_ids(&json!({"ids": ["u2"]})),
            Some(vec!["u2".to_string()])
        );
        assert!(parse_user_ids(&json!({"data": []})).is_none());
        assert!(parse_user_ids(&json!({"user_ids": [{"id": "u1"}]})).is_none());
    }

    #[test]
    fn test_bounded_rejects_zero_and_clamps() {
        assert!(bounded("concurrency", 0, MAX_CONCURRENCY).is_err());
        assert_eq!(bounded("concurrency", 64, MAX_CONCURRENCY).unwrap(), MAX_CONCURRENCY);
        assert_eq!(bounded("max_users", 7, MAX_USERS).unwrap(), 7);
    }

    #[tokio::test]
    async fn test_invalid_range_fails_before_listing_users() {
        let tool = OrgSummaryTool::sleep(offline_client(), chrono_tz::UTC);
        let err = tool.execute(json!({"days": 0})).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SensrError>(),
            Some(SensrError::InvalidArguments(_))
        ));
        let err = tool.execute(json!({"concurrency": 0})).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SensrError>(),
            Some(SensrError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_definitions_name_their_tools() {
        let client = offline_client();
        let sleep = OrgSummaryTool::sleep(client.clone(), chrono_tz::UTC).definition();
        assert_eq!(sleep.name, "get_org_sleep_summary");
        assert!(sleep.input_schema["properties"].get("max_users").is_some());
        assert_eq!(
            OrgSummaryTool::scores(client, chrono_tz::UTC).definition().name,
            "get_org_scores_summary"
        );
    }
}
