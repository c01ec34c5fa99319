//! MCP tool implementations.
//!
//! This module contains all tools exposed by the regcount server. Each tool
//! returns its result as pretty-printed JSON text content.

pub mod cache;
pub mod catalog;
pub mod changes;
pub mod organization;
pub mod title;

pub use cache::{cache_stats_impl, clear_expired_impl};
pub use catalog::{ListTitlesParams, list_titles_impl, recent_amendments_impl, up_to_date_titles_impl};
pub use changes::{CheckChangesParams, CheckTitleChangesParams, check_changes_impl, check_title_changes_impl};
pub use organization::{ProcessOrganizationParams, organization_impl};
pub use title::{ProcessChapterParams, ProcessTitleParams, chapter_impl, title_impl};

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use regcount_core::Error;

/// Wrap a serializable value as a successful tool result.
pub(crate) fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(Error::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
