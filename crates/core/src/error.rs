//! Unified error types for regcount.
//!
//! Every variant maps onto a stable MCP error code so tool callers can branch
//! on the failure kind without parsing messages.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Unified error types for the regcount pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty organization name).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Title, chapter or organization does not exist.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Title exists upstream but is reserved and has no content.
    #[error("RESERVED_TITLE: title {0} is reserved and has no content")]
    ReservedTitle(u32),

    /// Transport failure or non-success HTTP status.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Fetch exceeded its deadline.
    #[error("FETCH_TIMEOUT: {0}")]
    Timeout(String),

    /// Upstream response could not be interpreted.
    #[error("PARSE_ERROR: {0}")]
    Parse(String),

    /// Cache file could not be read or written.
    #[error("CACHE_ERROR: {0}")]
    Io(#[from] std::io::Error),

    /// Cache payload could not be (de)serialized.
    #[error("CACHE_ERROR: serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be loaded or is invalid.
    #[error("CONFIG_ERROR: {0}")]
    Config(String),
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::NotFound(msg) => (-32001, msg.clone()),
            Error::ReservedTitle(_) => (-32003, err.to_string()),
            Error::Network(msg) => (-32004, msg.clone()),
            Error::Timeout(msg) => (-32005, msg.clone()),
            Error::Parse(msg) => (-32006, msg.clone()),
            Error::Io(e) => (-32002, e.to_string()),
            Error::Serialization(e) => (-32002, e.to_string()),
            Error::Config(msg) => (-32007, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
