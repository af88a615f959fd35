use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, ErrorData as McpError, Implementation, ProtocolVersion,
    ServerCapabilities, ServerInfo,
};
use rmcp::transport::stdio;
use rmcp::{tool, tool_handler, tool_router, ServerHandler, ServiceExt};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::approval::{ApprovalCoordinator, ApprovalRequest};
use crate::error::GatehookError;

/// Arguments of the `approval_prompt` tool, as the assistant's permission
/// hook sends them.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ApprovalPromptArgs {
    /// Name of the tool requesting approval
    pub tool_name: String,

    /// Input parameters for the tool
    #[serde(default)]
    pub input: serde_json::Value,

    /// ID of the tool use
    #[serde(default)]
    pub tool_use_id: Option<String>,
}

/// MCP stdio server exposing the remote-approval tool.
///
/// Each `approval_prompt` call suspends inside the coordinator until the
/// request is approved, denied, or timed out, then returns the decision as
/// a JSON text block.
#[derive(Clone)]
pub struct ApprovalService {
    coordinator: Arc<ApprovalCoordinator>,
    /// Fallback session id when the tool input does not carry one.
    default_session_id: Option<String>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ApprovalService {
    pub fn new(coordinator: Arc<ApprovalCoordinator>, default_session_id: Option<String>) -> Self {
        Self {
            coordinator,
            default_session_id,
            tool_router: Self::tool_router(),
        }
    }

    fn session_id_for(&self, input: &serde_json::Value) -> Option<String> {
        input
            .get("session_id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| self.default_session_id.clone())
    }

    #[tool(description = "Request remote approval for a command")]
    async fn approval_prompt(
        &self,
        Parameters(args): Parameters<ApprovalPromptArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let session_id = self.session_id_for(&args.input);
        let request =
            ApprovalRequest::new(args.tool_name, args.input, args.tool_use_id, session_id);

        let decision = self
            .coordinator
            .create_and_await(request)
            .await
            .map_err(|e| match e {
                GatehookError::InvalidRequest { reason } => McpError::invalid_params(reason, None),
                other => McpError::internal_error(other.to_string(), None),
            })?;

        let text = serde_json::to_string(&decision)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[tool_handler]
impl ServerHandler for ApprovalService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "gatehook-remote-approval".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Gates tool calls behind remote approval. Call approval_prompt with the \
                 tool name and input; the call returns once a human approves or denies, \
                 or the request times out."
                    .into(),
            ),
        }
    }
}

/// Run the MCP server over stdin/stdout until the client disconnects.
pub async fn serve_stdio(service: ApprovalService) -> crate::error::Result<()> {
    let server = service
        .serve(stdio())
        .await
        .map_err(|e| GatehookError::Mcp {
            reason: format!("initialize failed: {e}"),
        })?;

    server.waiting().await.map_err(|e| GatehookError::Mcp {
        reason: format!("transport closed: {e}"),
    })?;
    Ok(())
}
