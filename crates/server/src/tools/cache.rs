//! cache_stats and clear_expired_cache tools.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use regcount_client::WordCountService;

use super::json_result;

/// Output from the clear_expired_cache tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClearExpiredOutput {
    /// Number of entries removed.
    pub cleared: usize,
}

/// Implementation of the cache_stats tool.
pub async fn cache_stats_impl(service: &WordCountService) -> Result<CallToolResult, McpError> {
    let stats = service.cache_stats().await;
    json_result(&stats)
}

/// Implementation of the clear_expired_cache tool.
pub async fn clear_expired_impl(service: &WordCountService) -> Result<CallToolResult, McpError> {
    let cleared = service.clear_expired_cache().await;
    json_result(&ClearExpiredOutput { cleared })
}
