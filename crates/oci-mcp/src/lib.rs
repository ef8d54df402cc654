//! MCP (Model Context Protocol) server for Oracle Cloud Infrastructure
//!
//! This crate exposes OCI compute and monitoring read operations as tools
//! for AI systems. Requests go through the OCI API when `~/.oci/config` is
//! usable and fall back to the `oci` CLI for instance listing otherwise.
//!
//! ## Binary Usage
//!
//! ```bash
//! # Stdio transport (for Claude Desktop, etc.)
//! oci-mcp --compartment-id ocid1.compartment.oc1..example
//!
//! # HTTP transport for shared deployments
//! oci-mcp --transport http --port 8080 --profile ASHBURN
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use oci_mcp::{AppState, tools};
//! use oci_mcp_core::AdapterSettings;
//! use tower_mcp::McpRouter;
//!
//! let state = Arc::new(AppState::new(&AdapterSettings::default()));
//!
//! let router = McpRouter::new()
//!     .tool(tools::compute::list_compute_instances(state.clone()))
//!     .tool(tools::monitoring::query_compute_metrics(state.clone()));
//! ```

pub mod envelope;
pub mod error;
pub mod prompts;
pub mod resources;
pub mod state;
pub mod tools;

pub use envelope::Method;
pub use error::McpError;
pub use state::AppState;
