//! Sensr tool layer
//!
//! Each tool is a [`ToolExecutor`] mapping its JSON arguments onto one call
//! against the [`SensrClient`], or a bounded sequence of calls for the email
//! scan, date ranges and organization summaries. Upstream bodies are never
//! altered; multi-call tools embed them under a `data` key.

pub mod args;
pub mod debug;
pub mod health;
pub mod org;
pub mod streams;
pub mod users;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono_tz::Tz;
use serde_json::Value;

use crate::client::SensrClient;
use crate::error::{Result, SensrError};
use crate::mcp::types::{McpTool, ToolAnnotations};

/// Tool executor trait implemented by every Sensr tool
///
/// # Examples
///
/// ```no_run
/// use sensorbio_mcp::tools::ToolExecutor;
/// use sensorbio_mcp::mcp::types::McpTool;
/// use sensorbio_mcp::error::Result;
/// use async_trait::async_trait;
/// use serde_json::Value;
///
/// struct Echo;
///
/// #[async_trait]
/// impl ToolExecutor for Echo {
///     fn definition(&self) -> McpTool {
///         McpTool {
///             name: "echo".to_string(),
///             description: Some("Returns its arguments".to_string()),
///             input_schema: serde_json::json!({"type": "object"}),
///             annotations: None,
///         }
///     }
///
///     async fn execute(&self, args: Value) -> Result<Value> {
///         Ok(args)
///     }
/// }
/// ```
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Name, description and JSON input schema of the tool
    fn definition(&self) -> McpTool;

    /// Executes the tool with the given arguments
    ///
    /// # Errors
    ///
    /// Returns [`SensrError::InvalidArguments`] before any network call when
    /// the arguments are invalid, otherwise whatever the client reports
    async fn execute(&self, args: Value) -> Result<Value>;
}

/// Builds the definition shared by all read-only Sensr tools
pub(crate) fn read_only_tool(name: &str, description: &str, input_schema: Value) -> McpTool {
    McpTool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema,
        annotations: Some(ToolAnnotations {
            read_only_hint: Some(true),
            open_world_hint: Some(true),
        }),
    }
}

/// Name-to-executor map, iterated in name order
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn ToolExecutor>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under the name its definition declares
    pub fn register(&mut self, executor: Arc<dyn ToolExecutor>) {
        let name = executor.definition().name;
        if self.tools.insert(name.clone(), executor).is_some() {
            tracing::warn!("Tool '{}' registered twice; keeping the latest", name);
        }
    }

    /// Get a tool executor by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.tools.get(name).cloned()
    }

    /// All tool definitions, sorted by name
    pub fn definitions(&self) -> Vec<McpTool> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    /// Runs the named tool
    ///
    /// # Errors
    ///
    /// Returns [`SensrError::UnknownTool`] for unregistered names, otherwise
    /// the tool's own error
    pub async fn call(&self, name: &str, args: Value) -> Result<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| SensrError::UnknownTool(name.to_string()))?;
        tool.execute(args).await
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Registry with every Sensr tool bound to `client`
///
/// `timezone` decides what "today" means for tools with an optional date.
pub fn build_registry(client: Arc<SensrClient>, timezone: Tz) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(users::ListUsersTool::new(client.clone())));
    registry.register(Arc::new(users::GetUserIdsTool::new(client.clone())));
    registry.register(Arc::new(users::SearchUserTool::new(client.clone())));
    registry.register(Arc::new(users::GetUserByEmailTool::new(client.clone())));
    registry.register(Arc::new(health::DailyRecordTool::sleep(
        client.clone(),
        timezone,
    )));
    registry.register(Arc::new(health::DailyRecordTool::scores(
        client.clone(),
        timezone,
    )));
    registry.register(Arc::new(health::CaloriesTool::new(client.clone(), timezone)));
    registry.register(Arc::new(org::OrgSummaryTool::sleep(client.clone(), timezone)));
    registry.register(Arc::new(org::OrgSummaryTool::scores(client.clone(), timezone)));
    registry.register(Arc::new(streams::TimeSeriesTool::activities(client.clone())));
    registry.register(Arc::new(streams::TimeSeriesTool::biometrics(client.clone())));
    registry.register(Arc::new(debug::DebugRequestTool::new(client)));

    tracing::debug!(tools = registry.len(), "Tool registry built");
    registry
}
