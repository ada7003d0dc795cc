//! The fixed set of n8n tools: names, descriptions, input schemas and handlers.
//!
//! Every handler returns the same shape: one text content block holding either the raw string or
//! the pretty-printed JSON result. Failures from n8n come back as `isError: true` results with the
//! error message (and upstream detail, when there is any) in that same text block.

use crate::client::N8nClient;
use crate::error::N8nError;
use crate::semantics::annotations_for;
use crate::validation::validate_tool_arguments;
use reqwest::Method;
use rmcp::ErrorData;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use serde::Deserialize;
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const WORKFLOWS_PATH: &str = "/api/v1/workflows";
pub const EXECUTIONS_PATH: &str = "/api/v1/executions";

pub const MAX_EXECUTIONS_LIMIT: u64 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Health,
    ListWorkflows,
    GetWorkflow,
    ActivateWorkflow,
    DeactivateWorkflow,
    ListExecutions,
}

impl ToolKind {
    pub const ALL: [Self; 6] = [
        Self::Health,
        Self::ListWorkflows,
        Self::GetWorkflow,
        Self::ActivateWorkflow,
        Self::DeactivateWorkflow,
        Self::ListExecutions,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Health => "n8n_health",
            Self::ListWorkflows => "n8n_list_workflows",
            Self::GetWorkflow => "n8n_get_workflow",
            Self::ActivateWorkflow => "n8n_activate_workflow",
            Self::DeactivateWorkflow => "n8n_deactivate_workflow",
            Self::ListExecutions => "n8n_list_executions",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Health => "n8n health",
            Self::ListWorkflows => "List workflows",
            Self::GetWorkflow => "Get workflow",
            Self::ActivateWorkflow => "Activate workflow",
            Self::DeactivateWorkflow => "Deactivate workflow",
            Self::ListExecutions => "List executions",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Health => "Check n8n health endpoint (/healthz).",
            Self::ListWorkflows => "List workflows via n8n REST API (/api/v1/workflows).",
            Self::GetWorkflow => "Get a workflow by id (/api/v1/workflows/{id}).",
            Self::ActivateWorkflow => "Activate a workflow (/api/v1/workflows/{id}/activate).",
            Self::DeactivateWorkflow => {
                "Deactivate a workflow (/api/v1/workflows/{id}/deactivate)."
            }
            Self::ListExecutions => "List executions (/api/v1/executions).",
        }
    }

    fn method(self) -> Method {
        match self {
            Self::Health
            | Self::ListWorkflows
            | Self::GetWorkflow
            | Self::ListExecutions => Method::GET,
            Self::ActivateWorkflow | Self::DeactivateWorkflow => Method::POST,
        }
    }

    fn input_schema(self) -> Value {
        let id = json!({
            "type": ["number", "string"],
            "description": "Workflow id"
        });
        match self {
            Self::Health => json!({ "type": "object", "properties": {} }),
            Self::ListWorkflows => json!({
                "type": "object",
                "properties": {
                    "active": {
                        "type": "boolean",
                        "description": "Filter by active status (true/false)."
                    }
                }
            }),
            Self::GetWorkflow | Self::ActivateWorkflow | Self::DeactivateWorkflow => json!({
                "type": "object",
                "properties": { "id": id },
                "required": ["id"]
            }),
            Self::ListExecutions => json!({
                "type": "object",
                "properties": {
                    "workflowId": {
                        "type": ["number", "string"],
                        "description": "Filter executions by workflow id"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_EXECUTIONS_LIMIT,
                        "description": "Limit results (1-250)"
                    }
                }
            }),
        }
    }

    fn to_tool(self) -> Tool {
        let schema = self
            .input_schema()
            .as_object()
            .cloned()
            .unwrap_or_else(JsonObject::new);
        let mut tool = Tool::new(self.name(), self.description(), Arc::new(schema));
        tool.annotations = Some(annotations_for(&self.method(), self.title()));
        tool
    }
}

/// Workflow id as accepted by n8n: a number or a string. Strings go into the path unescaped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WorkflowId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.write_str(&render_number(n)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListWorkflowsArgs {
    #[serde(default)]
    active: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct WorkflowIdArgs {
    id: WorkflowId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListExecutionsArgs {
    #[serde(default)]
    workflow_id: Option<WorkflowId>,
    /// Schema validation has already enforced an integer in 1..=250.
    #[serde(default)]
    limit: Option<serde_json::Number>,
}

struct RegisteredTool {
    kind: ToolKind,
    tool: Tool,
}

/// All tools this server exposes, bound to one [`N8nClient`].
pub struct ToolRegistry {
    client: N8nClient,
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new(client: N8nClient) -> Self {
        let tools = ToolKind::ALL
            .into_iter()
            .map(|kind| RegisteredTool {
                kind,
                tool: kind.to_tool(),
            })
            .collect();
        Self { client, tools }
    }

    /// The tool surface advertised in `tools/list`.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(|t| t.tool.clone()).collect()
    }

    /// Validate and dispatch a tool call.
    ///
    /// # Errors
    ///
    /// Returns an `invalid_params` [`ErrorData`] for unknown tools and for arguments that violate
    /// the tool's schema; in both cases nothing is sent to n8n. n8n failures are not protocol
    /// errors: they come back as `Ok` results with `is_error` set.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ErrorData> {
        let entry = self
            .tools
            .iter()
            .find(|t| t.tool.name == name)
            .ok_or_else(|| ErrorData::invalid_params(format!("unknown tool: {name}"), None))?;

        let args = Value::Object(arguments.unwrap_or_default());
        validate_tool_arguments(&entry.tool, &args)
            .map_err(|e| ErrorData::invalid_params(e.message, Some(e.data)))?;

        debug!(tool = %name, "dispatching tool call");
        let outcome = match entry.kind {
            ToolKind::Health => self.health().await,
            ToolKind::ListWorkflows => self.list_workflows(parse_args(args)?).await,
            ToolKind::GetWorkflow => {
                let WorkflowIdArgs { id } = parse_args(args)?;
                self.client
                    .request(Method::GET, &format!("{WORKFLOWS_PATH}/{id}"), None)
                    .await
                    .map(as_text)
            }
            ToolKind::ActivateWorkflow => {
                let WorkflowIdArgs { id } = parse_args(args)?;
                self.set_active(&id, true).await
            }
            ToolKind::DeactivateWorkflow => {
                let WorkflowIdArgs { id } = parse_args(args)?;
                self.set_active(&id, false).await
            }
            ToolKind::ListExecutions => self.list_executions(parse_args(args)?).await,
        };

        Ok(outcome.unwrap_or_else(|e| {
            warn!(tool = %name, error = %e, "tool call failed");
            error_result(&e)
        }))
    }

    async fn health(&self) -> crate::Result<CallToolResult> {
        let report = self.client.health().await?;
        info!(url = %report.url, status = report.status, "n8n health checked");
        Ok(as_text(Some(serde_json::to_value(report)?)))
    }

    async fn list_workflows(&self, args: ListWorkflowsArgs) -> crate::Result<CallToolResult> {
        let data = self.client.request(Method::GET, WORKFLOWS_PATH, None).await?;
        let data = match args.active {
            Some(active) => data.map(|d| filter_by_active(d, active)),
            None => data,
        };
        Ok(as_text(data))
    }

    async fn set_active(&self, id: &WorkflowId, active: bool) -> crate::Result<CallToolResult> {
        let action = if active { "activate" } else { "deactivate" };
        let data = self
            .client
            .request(Method::POST, &format!("{WORKFLOWS_PATH}/{id}/{action}"), None)
            .await?;
        info!(workflow = %id, action, "workflow state changed");
        Ok(as_text(data))
    }

    async fn list_executions(&self, args: ListExecutionsArgs) -> crate::Result<CallToolResult> {
        let path = executions_path(&args);
        let data = self.client.request(Method::GET, &path, None).await?;
        Ok(as_text(data))
    }
}

fn parse_args<T: for<'de> Deserialize<'de>>(args: Value) -> Result<T, ErrorData> {
    serde_json::from_value(args)
        .map_err(|e| ErrorData::invalid_params(format!("Invalid params: {e}"), None))
}

fn executions_path(args: &ListExecutionsArgs) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    if let Some(id) = &args.workflow_id {
        query.append_pair("workflowId", &id.to_string());
    }
    if let Some(limit) = &args.limit {
        query.append_pair("limit", &render_number(limit));
    }
    let qs = query.finish();
    if qs.is_empty() {
        EXECUTIONS_PATH.to_string()
    } else {
        format!("{EXECUTIONS_PATH}?{qs}")
    }
}

// Integral floats render without a fractional part (`5.0` -> `5`), the way n8n expects ids and
// limits in paths and query strings.
fn render_number(n: &serde_json::Number) -> String {
    if n.is_f64()
        && let Some(f) = n.as_f64()
        && f.is_finite()
        && f.fract() == 0.0
    {
        return if f == 0.0 { "0".to_string() } else { format!("{f:.0}") };
    }
    n.to_string()
}

/// Keep array entries whose `active` field is truthy (or falsy) to match `active`.
///
/// Non-array payloads pass through untouched.
fn filter_by_active(data: Value, active: bool) -> Value {
    match data {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|w| is_truthy(w.get("active")) == active)
                .collect(),
        ),
        other => other,
    }
}

fn is_truthy(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Wrap a result in the single text-content envelope every tool returns.
#[must_use]
pub fn as_text(data: Option<Value>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(render(data.as_ref()))])
}

fn render(data: Option<&Value>) -> String {
    match data {
        Some(Value::String(s)) => s.clone(),
        Some(v) => serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string()),
        None => "null".to_string(),
    }
}

fn error_result(e: &N8nError) -> CallToolResult {
    let text = match e.details() {
        Some(details) => format!("{e}\n{}", render(Some(details))),
        None => e.to_string(),
    };
    CallToolResult::error(vec![Content::text(text)])
}
