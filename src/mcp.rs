//! MCP server surface over the dispatcher.
//!
//! [`McpServer`] answers `tools/list` and `tools/call` for any rmcp transport,
//! so the `/mcp` route can be served by a real MCP endpoint. Every dispatch
//! outcome, failures included, comes back as a tool result rather than a
//! protocol error.

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler};
use serde_json::Value;
use std::sync::Arc;

use crate::dispatcher::Dispatcher;
use crate::tools::ToolResult;

/// Exposes the registered tools to MCP clients.
#[derive(Debug, Clone)]
pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
}

impl McpServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// MCP tool definitions for every registered tool, ordered by name.
    pub fn tools(&self) -> Vec<Tool> {
        self.dispatcher
            .list_tools()
            .into_iter()
            .map(|d| d.to_mcp_tool())
            .collect()
    }
}

/// Text results are passed through as-is; anything else is sent as JSON text.
pub fn into_call_tool_result(result: ToolResult) -> CallToolResult {
    match result {
        ToolResult::Success { result } => {
            let text = match result {
                Value::String(s) => s,
                other => other.to_string(),
            };
            CallToolResult::success(vec![Content::text(text)])
        }
        ToolResult::Failure { error } => {
            let text = serde_json::to_string(&error).unwrap_or_else(|_| error.to_string());
            CallToolResult::error(vec![Content::text(text)])
        }
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Search and summarize school data, or run a semantic search over stored records."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let args = request.arguments.unwrap_or_default();
        let result = self.dispatcher.invoke(&request.name, args).await;
        Ok(into_call_tool_result(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ErrorKind, ToolFailure};
    use serde_json::json;

    fn text_of(result: &CallToolResult) -> String {
        result.content[0]
            .as_text()
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }

    #[test]
    fn text_results_are_not_json_quoted() {
        let result = into_call_tool_result(ToolResult::success(json!("A fine school.")));
        assert_eq!(result.is_error, Some(false));
        assert_eq!(text_of(&result), "A fine school.");
    }

    #[test]
    fn structured_results_are_json_text() {
        let result = into_call_tool_result(ToolResult::success(json!([{"id": "1"}])));
        assert_eq!(text_of(&result), r#"[{"id":"1"}]"#);
    }

    #[test]
    fn failures_are_tool_errors_with_kind() {
        let result = into_call_tool_result(ToolResult::failure(ToolFailure::new(
            ErrorKind::UpstreamRejected,
            "HTTP 404",
        )));
        assert_eq!(result.is_error, Some(true));

        let body: Value = serde_json::from_str(&text_of(&result)).unwrap();
        assert_eq!(body["kind"], "UpstreamRejected");
    }

    #[test]
    fn builtin_tools_are_listed_with_schemas() {
        let services = crate::config::GatewayConfig {
            record_source_url: "http://records.local".to_string(),
            provider_api_key: "k".to_string(),
            ..Default::default()
        }
        .build()
        .unwrap();

        let tools = services.mcp.tools();
        let names: Vec<&str> = tools.iter().map(|t| &*t.name).collect();
        assert_eq!(names, vec!["search", "summarize", "vector_search"]);
        assert_eq!(tools[0].input_schema["required"], json!(["area", "city"]));
    }
}
