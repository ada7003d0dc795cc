//! MCP server over stdio.
//!
//! Binds the [`ToolRegistry`] to the host's stdin/stdout and serves until the host closes the
//! stream. Tool calls are independent; nothing is shared between them besides the HTTP client.

use crate::client::N8nClient;
use crate::config::EnvSource;
use crate::tools::ToolRegistry;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParams,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::transport::stdio;
use rmcp::{ErrorData, ServerHandler, ServiceExt as _};
use std::sync::Arc;
use tracing::info;

pub const SERVER_NAME: &str = "n8n";

#[derive(Clone)]
pub struct N8nMcpServer {
    registry: Arc<ToolRegistry>,
}

impl N8nMcpServer {
    #[must_use]
    pub fn new(env: EnvSource) -> Self {
        Self {
            registry: Arc::new(ToolRegistry::new(N8nClient::new(env))),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Serve MCP over stdin/stdout until the host disconnects.
    ///
    /// # Errors
    ///
    /// Returns an error if the MCP handshake fails or the session ends abnormally.
    pub async fn run_stdio(self) -> anyhow::Result<()> {
        info!(
            tools = self.registry.list_tools().len(),
            "starting n8n MCP server (stdio transport)"
        );

        let service = self
            .serve(stdio())
            .await
            .map_err(|e| anyhow::anyhow!("MCP server error: {e}"))?;

        let quit_reason = service
            .waiting()
            .await
            .map_err(|e| anyhow::anyhow!("MCP server error: {e}"))?;

        info!(?quit_reason, "n8n MCP server stopped");
        Ok(())
    }
}

impl ServerHandler for N8nMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = SERVER_NAME.to_string();
        server_info.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            instructions: Some(
                "n8n workflow automation. Use these tools to check server health, list, inspect, \
                 activate and deactivate workflows, and list executions."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info,
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.registry.list_tools(),
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.registry.call(&request.name, request.arguments).await
    }
}
