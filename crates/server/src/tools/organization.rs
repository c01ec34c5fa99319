//! process_organization tool.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use regcount_client::WordCountService;

use super::json_result;

/// Input parameters for process_organization tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProcessOrganizationParams {
    /// Organization name, abbreviation or part of its name.
    pub name: String,
}

/// Implementation of the process_organization tool.
pub async fn organization_impl(
    service: &WordCountService, params: ProcessOrganizationParams,
) -> Result<CallToolResult, McpError> {
    let aggregate = service.process_organization_by_name(&params.name).await?;
    json_result(&aggregate)
}
