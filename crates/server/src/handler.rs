//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

use regcount_client::WordCountService;

use crate::tools::{
    CheckChangesParams, CheckTitleChangesParams, ListTitlesParams, ProcessChapterParams, ProcessOrganizationParams,
    ProcessTitleParams, cache_stats_impl, chapter_impl, check_changes_impl, check_title_changes_impl,
    clear_expired_impl, list_titles_impl, organization_impl, recent_amendments_impl, title_impl,
    up_to_date_titles_impl,
};

/// The main MCP server handler for regcount.
#[derive(Clone)]
pub struct RegCountServer {
    service: Arc<WordCountService>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl RegCountServer {
    /// Create a new server handler over a shared counting service.
    pub fn new(service: Arc<WordCountService>) -> Self {
        Self { service, tool_router: Self::tool_router() }
    }

    #[tool(description = "Count the words of a whole CFR title. Returns word count, checksum, issue date and a text sample.")]
    async fn process_title(&self, params: Parameters<ProcessTitleParams>) -> Result<CallToolResult, McpError> {
        title_impl(&self.service, params.0).await
    }

    #[tool(description = "Count the words of one chapter of a CFR title. Fails with NOT_FOUND when the chapter cannot be located.")]
    async fn process_chapter(&self, params: Parameters<ProcessChapterParams>) -> Result<CallToolResult, McpError> {
        chapter_impl(&self.service, params.0).await
    }

    /// Titles are fetched one after another with a pause between them, so
    /// large organizations take a while on a cold cache.
    #[tool(
        description = "Aggregate word counts over every CFR title an organization references. Accepts full names, abbreviations or partial names."
    )]
    async fn process_organization(
        &self, params: Parameters<ProcessOrganizationParams>,
    ) -> Result<CallToolResult, McpError> {
        organization_impl(&self.service, params.0).await
    }

    #[tool(description = "Recompute an organization's aggregate and report whether its content changed since it was cached.")]
    async fn check_changes(&self, params: Parameters<CheckChangesParams>) -> Result<CallToolResult, McpError> {
        check_changes_impl(&self.service, params.0).await
    }

    #[tool(description = "Recompute one CFR title and report whether its content changed since it was cached.")]
    async fn check_title_changes(&self, params: Parameters<CheckTitleChangesParams>) -> Result<CallToolResult, McpError> {
        check_title_changes_impl(&self.service, params.0).await
    }

    #[tool(
        description = "List every CFR title, most recently updated first. Optional start_date and end_date (YYYY-MM-DD) keep only titles whose up_to_date_as_of falls in that range."
    )]
    async fn list_titles(&self, params: Parameters<ListTitlesParams>) -> Result<CallToolResult, McpError> {
        list_titles_impl(&self.service, params.0).await
    }

    #[tool(description = "Group non-reserved CFR titles by their latest amendment date, newest first.")]
    async fn recent_amendments(&self) -> Result<CallToolResult, McpError> {
        recent_amendments_impl(&self.service).await
    }

    #[tool(description = "Group non-reserved CFR titles by their latest issue date, newest first.")]
    async fn up_to_date_titles(&self) -> Result<CallToolResult, McpError> {
        up_to_date_titles_impl(&self.service).await
    }

    #[tool(description = "Report cache totals: entries, valid, expired and counts per entry type.")]
    async fn cache_stats(&self) -> Result<CallToolResult, McpError> {
        cache_stats_impl(&self.service).await
    }

    #[tool(description = "Remove expired cache entries and return how many were removed.")]
    async fn clear_expired_cache(&self) -> Result<CallToolResult, McpError> {
        clear_expired_impl(&self.service).await
    }
}

impl ServerHandler for RegCountServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "regcount".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Word counts, change detection and update timelines for Code of Federal Regulations titles, chapters and agencies."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
