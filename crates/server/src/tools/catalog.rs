//! list_titles, recent_amendments and up_to_date_titles tools.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use regcount_client::WordCountService;
use regcount_core::{DateRange, Error};

use super::json_result;

/// Input parameters for list_titles tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListTitlesParams {
    /// Earliest up_to_date_as_of date to include (YYYY-MM-DD). Requires end_date.
    #[serde(default)]
    pub start_date: Option<String>,

    /// Latest up_to_date_as_of date to include (YYYY-MM-DD). Requires start_date.
    #[serde(default)]
    pub end_date: Option<String>,
}

impl ListTitlesParams {
    fn range(&self) -> Result<Option<DateRange>, Error> {
        match (self.start_date.as_deref(), self.end_date.as_deref()) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => DateRange::parse(start, end).map(Some),
            _ => Err(Error::InvalidInput("start_date and end_date must be given together".into())),
        }
    }
}

/// Implementation of the list_titles tool.
pub async fn list_titles_impl(service: &WordCountService, params: ListTitlesParams) -> Result<CallToolResult, McpError> {
    let listing = service.list_titles(params.range()?).await?;
    json_result(&listing)
}

/// Implementation of the recent_amendments tool.
pub async fn recent_amendments_impl(service: &WordCountService) -> Result<CallToolResult, McpError> {
    let timeline = service.recent_amendments().await?;
    json_result(&timeline)
}

/// Implementation of the up_to_date_titles tool.
pub async fn up_to_date_titles_impl(service: &WordCountService) -> Result<CallToolResult, McpError> {
    let timeline = service.up_to_date_titles().await?;
    json_result(&timeline)
}
