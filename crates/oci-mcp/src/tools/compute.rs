//! Compute instance tools

use std::sync::Arc;

use chrono::{DateTime, Utc};
use oci_mcp_core::{CoreError, Instance, LifecycleState, Sourced};
use schemars::JsonSchema;
use serde::Deserialize;
use tower_mcp::extract::{Json, State};
use tower_mcp::{CallToolResult, McpRouter, Tool, ToolBuilder};
use tracing::{info, warn};

use crate::envelope::{Failure, InstanceDetailsResponse, InstanceListing, Method};
use crate::state::AppState;
use crate::tools::with_remediation;

const INSTRUCTIONS: &str = "\
### Compute Instances\n\
- list_compute_instances: List instances in a compartment by lifecycle state (API, falls back to CLI)\n\
- list_instances_with_network: List instances with private/public IPs and hostnames\n\
- get_instance_details: Full configuration of one instance, optionally with network info\n\
";

/// Instructions text describing the compute tools
pub fn instructions() -> &'static str {
    INSTRUCTIONS
}

/// Build an MCP sub-router containing the compute tools
pub fn router(state: Arc<AppState>) -> McpRouter {
    McpRouter::new()
        .tool(list_compute_instances(state.clone()))
        .tool(list_instances_with_network(state.clone()))
        .tool(get_instance_details(state))
}

fn default_lifecycle_state() -> String {
    LifecycleState::Running.to_string()
}

fn default_true() -> bool {
    true
}

/// Input for the instance listing tools
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListInstancesInput {
    /// Compartment OCID. Defaults to OCI_COMPARTMENT_ID, then the tenancy.
    #[serde(default)]
    pub compartment_id: Option<String>,
    /// Lifecycle state filter (RUNNING, STOPPED, ...). Defaults to RUNNING.
    #[serde(default = "default_lifecycle_state")]
    pub lifecycle_state: String,
}

/// Build the list_compute_instances tool
pub fn list_compute_instances(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("list_compute_instances")
        .description(
            "List compute instances in an OCI compartment filtered by lifecycle state. \
             Uses the OCI API and falls back to the OCI CLI when the API is unavailable.",
        )
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, ListInstancesInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(input): Json<ListInstancesInput>| async move {
                let listing = match list_instances(&state, &input).await {
                    Ok((scope, lifecycle_state, listed)) => {
                        let method = Method::from(listed.transport);
                        let summary = listing_summary(
                            &listed.value,
                            lifecycle_state,
                            state.adapter.region().unwrap_or("unknown"),
                            method,
                            &scope,
                            state.clock.now(),
                        );
                        InstanceListing::success(summary, listed.value, method)
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to list compute instances");
                        let summary = with_remediation(
                            format!("Failed to list compute instances: {}", e),
                            &e,
                        );
                        InstanceListing::failure(summary, e.to_string())
                    }
                };

                CallToolResult::from_serialize(&listing)
            },
        )
        .build()
}

async fn list_instances(
    state: &AppState,
    input: &ListInstancesInput,
) -> Result<(String, LifecycleState, Sourced<Vec<Instance>>), CoreError> {
    let scope = state.resolve_scope(input.compartment_id.as_deref())?;
    let lifecycle_state: LifecycleState = input.lifecycle_state.parse()?;

    info!(compartment_id = %scope, lifecycle_state = %lifecycle_state, "Listing compute instances");
    let listed = state.adapter.list_instances(&scope, lifecycle_state).await?;
    Ok((scope, lifecycle_state, listed))
}

fn listing_summary(
    instances: &[Instance],
    lifecycle_state: LifecycleState,
    region: &str,
    method: Method,
    scope: &str,
    now: DateTime<Utc>,
) -> String {
    let mut output = format!(
        "Found {} {} compute instances in {}:\n\n",
        instances.len(),
        lifecycle_state,
        region
    );

    for (i, instance) in instances.iter().enumerate() {
        output.push_str(&format!(
            "{:2}. {} ({}) - {}\n",
            i + 1,
            instance.display_name,
            instance.shape,
            instance.lifecycle_state
        ));
    }

    output.push_str(&format!("\nRetrieved using: {}\n", method.label()));
    output.push_str(&format!("Compartment: {}\n", scope));
    output.push_str(&format!("Retrieved at: {}", now.to_rfc3339()));
    output
}

/// Build the list_instances_with_network tool
pub fn list_instances_with_network(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("list_instances_with_network")
        .description(
            "List compute instances together with their network information: private IP, \
             public IP and hostname of the primary VNIC. Needs the OCI API; without it the \
             CLI listing is returned with empty network fields.",
        )
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, ListInstancesInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(input): Json<ListInstancesInput>| async move {
                let listing = match list_with_network(&state, &input).await {
                    Ok((instances, method)) => {
                        let included = method == Method::Sdk;
                        let summary = network_summary(&instances, method, state.clock.now());
                        InstanceListing::success(summary, instances, method)
                            .with_network_flag(included)
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to list instances with network info");
                        let summary = with_remediation(
                            format!("Failed to list instances with network info: {}", e),
                            &e,
                        );
                        InstanceListing::failure(summary, e.to_string()).with_network_flag(false)
                    }
                };

                CallToolResult::from_serialize(&listing)
            },
        )
        .build()
}

/// Enriched API listing when both clients exist, else a plain CLI listing.
///
/// An API failure is returned as-is; this tool does not retry through the CLI.
async fn list_with_network(
    state: &AppState,
    input: &ListInstancesInput,
) -> Result<(Vec<Instance>, Method), CoreError> {
    let scope = state.resolve_scope(input.compartment_id.as_deref())?;
    let lifecycle_state: LifecycleState = input.lifecycle_state.parse()?;
    let adapter = &state.adapter;

    if adapter.has_compute() && adapter.has_network() {
        let instances = adapter
            .list_instances_with_network(&scope, lifecycle_state)
            .await?;
        return Ok((instances, Method::Sdk));
    }

    info!(compartment_id = %scope, "Network clients unavailable, listing through the CLI");
    let mut instances = adapter.list_instances_cli(&scope, lifecycle_state).await?;
    for instance in &mut instances {
        instance.clear_network();
    }
    Ok((instances, Method::CliLimited))
}

fn network_summary(instances: &[Instance], method: Method, now: DateTime<Utc>) -> String {
    let mut output = format!(
        "Found {} compute instances with network information:\n\n",
        instances.len()
    );

    for (i, instance) in instances.iter().enumerate() {
        output.push_str(&format!(
            "{:2}. {} ({})\n",
            i + 1,
            instance.display_name,
            instance.shape
        ));
        output.push_str(&format!(
            "    Private IP: {}\n",
            instance.primary_private_ip.as_deref().unwrap_or("N/A")
        ));
        output.push_str(&format!(
            "    Public IP: {}\n",
            instance.primary_public_ip.as_deref().unwrap_or("None")
        ));
        output.push_str(&format!(
            "    Hostname: {}\n\n",
            instance.hostname.as_deref().unwrap_or("N/A")
        ));
    }

    let included = if method == Method::Sdk {
        "Yes"
    } else {
        "No (requires SDK)"
    };
    output.push_str(&format!("Network info included: {}\n", included));
    output.push_str(&format!("Retrieved using: {}\n", method.label()));
    output.push_str(&format!("Retrieved at: {}", now.to_rfc3339()));
    output
}

/// Input for get_instance_details
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetInstanceDetailsInput {
    /// Instance OCID
    pub instance_id: String,
    /// Compartment used to look up VNIC attachments. Defaults to the configured scope.
    #[serde(default)]
    pub compartment_id: Option<String>,
    /// Include VNIC information (default: true)
    #[serde(default = "default_true")]
    pub include_network: bool,
}

/// Build the get_instance_details tool
pub fn get_instance_details(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("get_instance_details")
        .description(
            "Get the full configuration of one compute instance: shape, placement, metadata, \
             launch and agent options, and (by default) its network interfaces. Requires the \
             OCI API.",
        )
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, GetInstanceDetailsInput>(
            state,
            |State(state): State<Arc<AppState>>,
             Json(input): Json<GetInstanceDetailsInput>| async move {
                match instance_details(&state, &input).await {
                    Ok(response) => CallToolResult::from_serialize(&response),
                    Err(e) => {
                        warn!(instance_id = %input.instance_id, error = %e, "Failed to get instance details");
                        CallToolResult::from_serialize(&Failure::new(
                            format!("Failed to get instance details: {}", e),
                            state.clock.now(),
                        ))
                    }
                }
            },
        )
        .build()
}

async fn instance_details(
    state: &AppState,
    input: &GetInstanceDetailsInput,
) -> Result<InstanceDetailsResponse, CoreError> {
    let instance_id = input.instance_id.trim();
    if instance_id.is_empty() {
        return Err(CoreError::RequiredInputMissing("instance_id"));
    }

    let adapter = &state.adapter;
    let mut details = adapter.get_instance_details(instance_id).await?;

    let mut includes_network_info = false;
    if input.include_network && adapter.has_network() {
        let scope = state
            .resolve_scope(input.compartment_id.as_deref())
            .unwrap_or_else(|_| details.instance.compartment_id.clone());

        match adapter.network_info(instance_id, &scope).await {
            Ok(network_info) => {
                details.instance.attach_network(network_info);
                includes_network_info = true;
            }
            Err(e) => {
                warn!(instance_id = %instance_id, error = %e, "Failed to get network info for instance");
                details.instance.clear_network();
            }
        }
    }

    Ok(InstanceDetailsResponse {
        instance: details,
        includes_network_info,
        method: Method::Sdk,
        logan_compatible: true,
        retrieved_at: state.clock.now(),
        service: "OCI Core Services",
        operation_type: "get_instance_details",
        success: true,
    })
}
