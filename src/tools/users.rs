//! Organization user tools

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::SensrClient;
use crate::error::Result;
use crate::mcp::types::McpTool;
use crate::tools::args::{parse_args, push_param, require_non_empty};
use crate::tools::{read_only_tool, ToolExecutor};

const USERS_PATH: &str = "/v1/organizations/users";
pub(crate) const USER_IDS_PATH: &str = "/v1/organizations/users/ids";

/// Page size used when scanning for an email address
pub const EMAIL_SCAN_PAGE_SIZE: u32 = 200;

/// Maximum number of pages scanned for an email address
pub const EMAIL_SCAN_MAX_PAGES: u32 = 50;

fn default_page() -> u32 {
    1
}

fn default_list_limit() -> u32 {
    100
}

fn default_search_limit() -> u32 {
    50
}

fn users_query(page: u32, limit: u32, q: Option<&str>) -> Vec<(String, String)> {
    let mut query = Vec::new();
    push_param(&mut query, "page", page);
    push_param(&mut query, "items_per_page", limit);
    if let Some(q) = q {
        push_param(&mut query, "q", q);
    }
    query
}

#[derive(Debug, Deserialize)]
struct ListUsersArgs {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_list_limit")]
    limit: u32,
    #[serde(default)]
    search: Option<String>,
}

/// `list_users`: one page of organization users
pub struct ListUsersTool {
    client: Arc<SensrClient>,
}

impl ListUsersTool {
    /// Creates the tool bound to `client`
    pub fn new(client: Arc<SensrClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolExecutor for ListUsersTool {
    fn definition(&self) -> McpTool {
        read_only_tool(
            "list_users",
            "List users in the organization, one page at a time.",
            json!({
                "type": "object",
                "properties": {
                    "page": {"type": "integer", "minimum": 1, "default": 1},
                    "limit": {"type": "integer", "minimum": 1, "default": 100, "description": "Users per page"},
                    "search": {"type": "string", "description": "Free-text filter on name or email"}
                }
            }),
        )
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: ListUsersArgs = parse_args("list_users", args)?;
        let search = args
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        self.client
            .get(USERS_PATH, &users_query(args.page, args.limit, search))
            .await
    }
}

/// `get_user_ids`: every user id in the organization
pub struct GetUserIdsTool {
    client: Arc<SensrClient>,
}

impl GetUserIdsTool {
    /// Creates the tool bound to `client`
    pub fn new(client: Arc<SensrClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolExecutor for GetUserIdsTool {
    fn definition(&self) -> McpTool {
        read_only_tool(
            "get_user_ids",
            "Get the ids of all users in the organization.",
            json!({"type": "object", "properties": {}}),
        )
    }

    async fn execute(&self, _args: Value) -> Result<Value> {
        self.client.get(USER_IDS_PATH, &[]).await
    }
}

#[derive(Debug, Deserialize)]
struct SearchUserArgs {
    query: String,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_search_limit")]
    limit: u32,
}

/// `search_user`: free-text user search
pub struct SearchUserTool {
    client: Arc<SensrClient>,
}

impl SearchUserTool {
    /// Creates the tool bound to `client`
    pub fn new(client: Arc<SensrClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolExecutor for SearchUserTool {
    fn definition(&self) -> McpTool {
        read_only_tool(
            "search_user",
            "Search organization users by a free-text query (name or email).",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "page": {"type": "integer", "minimum": 1, "default": 1},
                    "limit": {"type": "integer", "minimum": 1, "default": 50}
                },
                "required": ["query"]
            }),
        )
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: SearchUserArgs = parse_args("search_user", args)?;
        let query = require_non_empty("query", &args.query)?;
        self.client
            .get(USERS_PATH, &users_query(args.page, args.limit, Some(&query)))
            .await
    }
}

#[derive(Debug, Deserialize)]
struct GetUserByEmailArgs {
    email: String,
}

/// `get_user_by_email`: exact, case-insensitive email lookup
///
/// Scans up to [`EMAIL_SCAN_MAX_PAGES`] pages of [`EMAIL_SCAN_PAGE_SIZE`]
/// users filtered by the email. Returns `{"data": user}` for the first match
/// and `{"data": null}` when none is found.
pub struct GetUserByEmailTool {
    client: Arc<SensrClient>,
}

impl GetUserByEmailTool {
    /// Creates the tool bound to `client`
    pub fn new(client: Arc<SensrClient>) -> Self {
        Self { client }
    }
}

fn find_email<'a>(page: &'a Value, email: &str) -> Option<&'a Value> {
    let wanted = email.to_lowercase();
    page.get("data")?.as_array()?.iter().find(|user| {
        user.get("email")
            .and_then(Value::as_str)
            .map(|candidate| candidate.to_lowercase() == wanted)
            .unwrap_or(false)
    })
}

fn is_last_page(page: &Value) -> bool {
    let meta = page.get("meta");
    let current = meta.and_then(|m| m.get("current_page")).and_then(Value::as_u64);
    let total = meta.and_then(|m| m.get("total_pages")).and_then(Value::as_u64);
    if let (Some(current), Some(total)) = (current, total) {
        if current >= total {
            return true;
        }
    }

    page.get("data")
        .and_then(Value::as_array)
        .map(|users| users.is_empty())
        .unwrap_or(true)
}

#[async_trait]
impl ToolExecutor for GetUserByEmailTool {
    fn definition(&self) -> McpTool {
        read_only_tool(
            "get_user_by_email",
            "Find a user by exact email address. Returns {data: user|null}.",
            json!({
                "type": "object",
                "properties": {
                    "email": {"type": "string", "format": "email"}
                },
                "required": ["email"]
            }),
        )
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: GetUserByEmailArgs = parse_args("get_user_by_email", args)?;
        let email = require_non_empty("email", &args.email)?;

        for page in 1..=EMAIL_SCAN_MAX_PAGES {
            let query = users_query(page, EMAIL_SCAN_PAGE_SIZE, Some(&email));
            let response = self.client.get(USERS_PATH, &query).await?;

            if let Some(user) = find_email(&response, &email) {
                return Ok(json!({ "data": user }));
            }
            if is_last_page(&response) {
                break;
            }
        }

        tracing::debug!("No user found for the requested email");
        Ok(json!({ "data": null }))
    }
}
