//! process_title and process_chapter tools.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use regcount_client::WordCountService;

use super::json_result;

/// Input parameters for process_title tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProcessTitleParams {
    /// CFR title number (1-50).
    pub title: u32,
}

/// Input parameters for process_chapter tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProcessChapterParams {
    /// CFR title number (1-50).
    pub title: u32,

    /// Chapter identifier as printed in the title, e.g. "I", "IV" or "5".
    pub chapter: String,
}

/// Implementation of the process_title tool.
pub async fn title_impl(service: &WordCountService, params: ProcessTitleParams) -> Result<CallToolResult, McpError> {
    let result = service.process_title(params.title).await?;
    json_result(&result)
}

/// Implementation of the process_chapter tool.
pub async fn chapter_impl(service: &WordCountService, params: ProcessChapterParams) -> Result<CallToolResult, McpError> {
    let result = service.process_chapter(params.title, &params.chapter).await?;
    json_result(&result)
}
