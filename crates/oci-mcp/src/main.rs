//! oci-mcp: MCP server for Oracle Cloud Infrastructure
//!
//! A standalone MCP server that exposes OCI compute and monitoring read
//! operations as tools for AI systems.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use oci_mcp::{AppState, McpError, tools};
use oci_mcp_core::AdapterSettings;
use oci_mcp_core::config::DEFAULT_PROFILE;
use tower_mcp::{McpRouter, transport::StdioTransport};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Transport mode for the MCP server
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Transport {
    /// Standard input/output (for CLI integrations)
    #[default]
    Stdio,
    /// HTTP with Server-Sent Events (for shared deployments)
    Http,
}

/// Toolsets that can be enabled or disabled at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
enum Toolset {
    /// Instance listing and details
    Compute,
    /// Metric queries
    Monitoring,
    /// Connection test, resources, and prompts
    Diagnostics,
}

impl Toolset {
    const ALL: [Toolset; 3] = [Toolset::Compute, Toolset::Monitoring, Toolset::Diagnostics];
}

impl std::fmt::Display for Toolset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Toolset::Compute => write!(f, "compute"),
            Toolset::Monitoring => write!(f, "monitoring"),
            Toolset::Diagnostics => write!(f, "diagnostics"),
        }
    }
}

/// MCP server for OCI compute instances and monitoring metrics
#[derive(Parser, Debug)]
#[command(name = "oci-mcp")]
#[command(version, about, long_about = None)]
struct Args {
    /// Transport mode
    #[arg(short, long, value_enum, default_value = "stdio")]
    transport: Transport,

    /// OCI config file (default: ~/.oci/config)
    #[arg(long, env = "OCI_CONFIG_FILE")]
    config_file: Option<PathBuf>,

    /// Profile within the OCI config file
    #[arg(short, long, env = "OCI_CLI_PROFILE", default_value = DEFAULT_PROFILE)]
    profile: String,

    /// Default compartment OCID (overrides the tenancy)
    #[arg(long, env = "OCI_COMPARTMENT_ID")]
    compartment_id: Option<String>,

    /// OCI CLI executable used for the fallback path
    #[arg(long, env = "OCI_CLI_PATH", default_value = "oci")]
    oci_cli: PathBuf,

    /// Timeout for one OCI CLI invocation, in seconds
    #[arg(long, default_value = "60")]
    cli_timeout_secs: u64,

    /// Timeout for one OCI API request, in seconds
    #[arg(long, default_value = "30")]
    api_timeout_secs: u64,

    /// Toolsets to enable (default: all). Options: compute, monitoring, diagnostics.
    #[arg(long, value_delimiter = ',', value_enum)]
    tools: Option<Vec<Toolset>>,

    // --- HTTP transport options ---
    /// Host to bind HTTP server
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind HTTP server
    #[arg(long, default_value = "8080")]
    port: u16,

    // --- Rate limiting ---
    /// Maximum concurrent requests
    #[arg(long, default_value = "10")]
    max_concurrent: usize,

    /// Request timeout in seconds (HTTP mode)
    #[arg(long, default_value = "30")]
    request_timeout_secs: u64,

    // --- Logging ---
    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,
}

impl Args {
    /// Reject limits the transports cannot run with
    fn validate(&self) -> Result<(), McpError> {
        for (flag, value) in [
            ("--cli-timeout-secs", self.cli_timeout_secs),
            ("--api-timeout-secs", self.api_timeout_secs),
            ("--request-timeout-secs", self.request_timeout_secs),
        ] {
            if value == 0 {
                return Err(McpError::Configuration(format!("{} must be at least 1", flag)));
            }
        }
        if self.max_concurrent == 0 {
            return Err(McpError::InvalidParameters(
                "--max-concurrent must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn adapter_settings(&self) -> AdapterSettings {
        AdapterSettings {
            config_file: self.config_file.clone(),
            profile: self.profile.clone(),
            compartment_override: self.compartment_id.clone(),
            cli_program: self.oci_cli.clone(),
            cli_timeout: Duration::from_secs(self.cli_timeout_secs),
            api_timeout: Duration::from_secs(self.api_timeout_secs),
            endpoints: None,
        }
    }
}

/// Explicit `--tools` flag, else every toolset
fn enabled_toolsets(args: &Args) -> HashSet<Toolset> {
    match &args.tools {
        Some(tools) => tools.iter().copied().collect(),
        None => Toolset::ALL.into_iter().collect(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.validate()?;

    // Logs go to stderr; stdout carries the stdio transport
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| args.log_level.clone().into()))
        .init();

    let enabled = enabled_toolsets(&args);
    let enabled_names: Vec<String> = enabled.iter().map(|t| t.to_string()).collect();

    info!(
        transport = ?args.transport,
        profile = %args.profile,
        toolsets = ?enabled_names,
        "Starting oci-mcp server"
    );

    let settings = args.adapter_settings();
    let state = Arc::new(AppState::new(&settings));

    log_banner(&state, &enabled);

    let router = build_router(state.clone(), &enabled)?;

    match args.transport {
        Transport::Stdio => {
            info!("Running with stdio transport");
            StdioTransport::new(router).run().await?;
        }
        Transport::Http => {
            info!(host = %args.host, port = args.port, "Running with HTTP transport");
            run_http_server(router, &args).await?;
        }
    }

    Ok(())
}

/// Tool names per toolset, for the startup banner
fn tool_names(toolset: Toolset) -> &'static [&'static str] {
    match toolset {
        Toolset::Compute => &[
            "list_compute_instances",
            "list_instances_with_network",
            "get_instance_details",
        ],
        Toolset::Monitoring => &["query_compute_metrics"],
        Toolset::Diagnostics => &["test_oci_connection"],
    }
}

fn log_banner(state: &AppState, enabled: &HashSet<Toolset>) {
    let adapter = &state.adapter;
    let available: Vec<&str> = Toolset::ALL
        .into_iter()
        .filter(|t| enabled.contains(t))
        .flat_map(tool_names)
        .copied()
        .collect();

    info!(tools = ?available, "Available tools");
    info!(sdk_available = adapter.has_compute(), "OCI SDK Available");
    info!(
        region = adapter.region().unwrap_or("Not configured"),
        "Region"
    );
    info!(
        compartment_id = %adapter.get_default_scope().unwrap_or_else(|| "Not set".to_string()),
        "Compartment ID"
    );
}

/// Footer instructions on data sources
const SOURCE_INSTRUCTIONS: &str = r#"
## Data Sources

Requests use the OCI API with the profile from ~/.oci/config. Without a usable
config, instance listing falls back to the oci CLI and the other tools answer
with success: false and an error message.
"#;

/// Build the MCP router with one sub-router per enabled toolset
fn build_router(state: Arc<AppState>, enabled: &HashSet<Toolset>) -> Result<McpRouter> {
    let mut instructions = String::from(
        r#"OCI Compute & Metrics MCP Server

This server provides read-only tools for Oracle Cloud Infrastructure compute
instances, their network interfaces, and monitoring metrics.

## Available Tool Categories
"#,
    );

    let mut router = McpRouter::new().server_info("oci-mcp", env!("CARGO_PKG_VERSION"));

    if enabled.contains(&Toolset::Compute) {
        router = router.merge(tools::compute::router(state.clone()));
        instructions.push_str(tools::compute::instructions());
    }

    if enabled.contains(&Toolset::Monitoring) {
        router = router.merge(tools::monitoring::router(state.clone()));
        instructions.push_str(tools::monitoring::instructions());
    }

    if enabled.contains(&Toolset::Diagnostics) {
        router = router.merge(tools::diagnostics::router(state.clone()));
        instructions.push_str(tools::diagnostics::instructions());
    }

    instructions.push_str(SOURCE_INSTRUCTIONS);
    router = router.instructions(&instructions);

    Ok(router)
}

/// Run the HTTP server with middleware
#[cfg(feature = "http")]
async fn run_http_server(router: McpRouter, args: &Args) -> Result<()> {
    use tower::limit::ConcurrencyLimitLayer;
    use tower::timeout::TimeoutLayer;
    use tower_mcp::HttpTransport;

    let addr = format!("{}:{}", args.host, args.port);

    let transport = HttpTransport::new(router)
        .layer(TimeoutLayer::new(Duration::from_secs(
            args.request_timeout_secs,
        )))
        .layer(ConcurrencyLimitLayer::new(args.max_concurrent));

    transport.serve(&addr).await?;

    Ok(())
}

#[cfg(not(feature = "http"))]
async fn run_http_server(_router: McpRouter, _args: &Args) -> Result<()> {
    anyhow::bail!("HTTP transport requires the 'http' feature")
}

#[cfg(test)]
mod tests {
    use super::*;
    use oci_mcp_core::ProviderAdapter;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("oci-mcp").chain(argv.iter().copied())).unwrap()
    }

    fn degraded_state() -> Arc<AppState> {
        Arc::new(AppState::with_adapter(ProviderAdapter::builder().build()))
    }

    #[test]
    fn all_toolsets_by_default() {
        let args = parse(&[]);
        let enabled = enabled_toolsets(&args);
        assert_eq!(enabled.len(), 3);
        assert!(enabled.contains(&Toolset::Compute));
        assert!(enabled.contains(&Toolset::Monitoring));
        assert!(enabled.contains(&Toolset::Diagnostics));
    }

    #[test]
    fn explicit_toolsets() {
        let args = parse(&["--tools", "compute,diagnostics"]);
        let enabled = enabled_toolsets(&args);
        assert_eq!(enabled.len(), 2);
        assert!(!enabled.contains(&Toolset::Monitoring));
    }

    #[test]
    fn unknown_toolset_rejected() {
        let result = Args::try_parse_from(["oci-mcp", "--tools", "storage"]);
        assert!(result.is_err());
    }

    #[test]
    fn settings_from_flags() {
        let args = parse(&[
            "--config-file",
            "/etc/oci/config",
            "--profile",
            "PHOENIX",
            "--compartment-id",
            "ocid1.compartment.oc1..c",
            "--oci-cli",
            "/usr/local/bin/oci",
            "--cli-timeout-secs",
            "5",
            "--api-timeout-secs",
            "7",
        ]);
        let settings = args.adapter_settings();

        assert_eq!(settings.config_file, Some(PathBuf::from("/etc/oci/config")));
        assert_eq!(settings.profile, "PHOENIX");
        assert_eq!(
            settings.compartment_override.as_deref(),
            Some("ocid1.compartment.oc1..c")
        );
        assert_eq!(settings.cli_program, PathBuf::from("/usr/local/bin/oci"));
        assert_eq!(settings.cli_timeout, Duration::from_secs(5));
        assert_eq!(settings.api_timeout, Duration::from_secs(7));
        assert!(settings.endpoints.is_none());
    }

    #[test]
    fn zero_limits_rejected() {
        assert!(parse(&[]).validate().is_ok());

        let err = parse(&["--cli-timeout-secs", "0"]).validate().unwrap_err();
        assert!(matches!(err, McpError::Configuration(_)));
        assert!(err.to_string().contains("--cli-timeout-secs"));

        let err = parse(&["--max-concurrent", "0"]).validate().unwrap_err();
        assert!(matches!(err, McpError::InvalidParameters(_)));
    }

    #[test]
    fn http_defaults() {
        let args = parse(&["--transport", "http"]);
        assert!(matches!(args.transport, Transport::Http));
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 8080);
        assert_eq!(args.max_concurrent, 10);
        assert_eq!(args.request_timeout_secs, 30);
    }

    #[test]
    fn router_builds_for_every_subset() {
        let state = degraded_state();
        for toolset in Toolset::ALL {
            let enabled: HashSet<Toolset> = [toolset].into_iter().collect();
            assert!(build_router(state.clone(), &enabled).is_ok());
        }
        let all: HashSet<Toolset> = Toolset::ALL.into_iter().collect();
        assert!(build_router(state, &all).is_ok());
    }

    #[test]
    fn banner_tool_names_cover_every_tool() {
        let names: Vec<&str> = Toolset::ALL
            .into_iter()
            .flat_map(tool_names)
            .copied()
            .collect();
        assert_eq!(names.len(), 5);
        assert!(names.contains(&"query_compute_metrics"));
    }
}
