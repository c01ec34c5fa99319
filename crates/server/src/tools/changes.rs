//! check_changes and check_title_changes tools.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use regcount_client::WordCountService;

use super::json_result;

/// Input parameters for check_changes tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CheckChangesParams {
    /// Organization name, abbreviation or partial name.
    pub identifier: String,
}

/// Input parameters for check_title_changes tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CheckTitleChangesParams {
    /// CFR title number (1-50).
    pub title: u32,
}

/// Implementation of the check_changes tool.
pub async fn check_changes_impl(
    service: &WordCountService, params: CheckChangesParams,
) -> Result<CallToolResult, McpError> {
    let report = service.check_changes(params.identifier.trim()).await?;
    json_result(&report)
}

/// Implementation of the check_title_changes tool.
pub async fn check_title_changes_impl(
    service: &WordCountService, params: CheckTitleChangesParams,
) -> Result<CallToolResult, McpError> {
    let report = service.check_title_changes(params.title).await?;
    json_result(&report)
}
