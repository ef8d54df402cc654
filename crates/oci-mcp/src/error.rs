//! Error types for the MCP server

use thiserror::Error;

/// Startup errors raised before the server starts serving.
///
/// Tool handlers never surface these to the caller; failures inside a tool
/// become a failure envelope instead.
#[derive(Error, Debug)]
pub enum McpError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}
