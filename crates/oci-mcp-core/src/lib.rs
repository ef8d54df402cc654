//! # oci-mcp-core
//!
//! Provider adapter for the OCI MCP server. It owns everything that talks to
//! Oracle Cloud Infrastructure:
//!
//! - **Config** ([`config`]) - `~/.oci/config` profile discovery
//! - **Transports** ([`transport`]) - signed REST client and `oci` CLI runner
//! - **Adapter** ([`adapter`]) - one operation interface over both
//!   transports, with the fallback and best-effort rules per operation
//! - **Model** ([`model`]) - transport-agnostic records handed to tools
//! - **Time** ([`time`]) - metric time range expressions
//!
//! The MCP layer (`oci-mcp`) depends on this crate and never sees a
//! transport directly.

pub mod adapter;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod time;
pub mod transport;

#[cfg(feature = "test-support")]
pub mod testing;

pub use adapter::{
    AdapterSettings, FailurePolicy, MetricRequest, Operation, ProviderAdapter, Sourced,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, OciConfig};
pub use error::{CoreError, Result};
pub use model::{
    Instance, InstanceDetails, LifecycleState, MetricPoint, MetricSeries, NetworkAttachment,
    NetworkInfo, NetworkInterface,
};
pub use transport::TransportKind;
