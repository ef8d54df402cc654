//! Monitoring metric tools

use std::sync::Arc;

use oci_mcp_core::model::StringMap;
use oci_mcp_core::time::{parse_absolute_time, parse_time_expression};
use oci_mcp_core::{CoreError, MetricRequest};
use schemars::JsonSchema;
use serde::Deserialize;
use tower_mcp::extract::{Json, State};
use tower_mcp::{CallToolResult, McpRouter, Tool, ToolBuilder};
use tracing::{info, warn};

use crate::envelope::{Failure, Method, MetricQueryEcho, MetricsResponse};
use crate::state::AppState;

/// Namespace of the metrics published by the Oracle Cloud Agent
pub const COMPUTE_AGENT_NAMESPACE: &str = "oci_computeagent";

const INSTRUCTIONS: &str = "\
### Monitoring\n\
- query_compute_metrics: Query a compute agent metric (CpuUtilization, MemoryUtilization, ...) \
for one instance. start_time accepts '24h', '7d' or an ISO-8601 timestamp; end_time accepts \
only ISO-8601 and defaults to now.\n\
";

/// Instructions text describing the monitoring tools
pub fn instructions() -> &'static str {
    INSTRUCTIONS
}

/// Build an MCP sub-router containing the monitoring tools
pub fn router(state: Arc<AppState>) -> McpRouter {
    McpRouter::new().tool(query_compute_metrics(state))
}

/// Input for query_compute_metrics
#[derive(Debug, Deserialize, JsonSchema)]
pub struct QueryComputeMetricsInput {
    /// Instance OCID
    pub instance_id: String,
    /// Metric name, e.g. CpuUtilization, MemoryUtilization, NetworksBytesIn
    pub metric_name: String,
    /// Start of the range: '<n>h', '<n>d' or an ISO-8601 timestamp
    pub start_time: String,
    /// End of the range as an ISO-8601 timestamp (default: now)
    #[serde(default)]
    pub end_time: Option<String>,
    /// Compartment OCID. Defaults to OCI_COMPARTMENT_ID, then the tenancy.
    #[serde(default)]
    pub compartment_id: Option<String>,
}

/// Build the query_compute_metrics tool
pub fn query_compute_metrics(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("query_compute_metrics")
        .description(
            "Query OCI Monitoring for a compute agent metric of one instance, aggregated to \
             one-minute means. Requires the OCI API.",
        )
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, QueryComputeMetricsInput>(
            state,
            |State(state): State<Arc<AppState>>,
             Json(input): Json<QueryComputeMetricsInput>| async move {
                match query_metrics(&state, &input).await {
                    Ok(response) => CallToolResult::from_serialize(&response),
                    Err(e) => {
                        warn!(
                            instance_id = %input.instance_id,
                            metric = %input.metric_name,
                            error = %e,
                            "Failed to query compute metrics"
                        );
                        CallToolResult::from_serialize(&Failure::new(
                            format!("Failed to query compute metrics: {}", e),
                            state.clock.now(),
                        ))
                    }
                }
            },
        )
        .build()
}

async fn query_metrics(
    state: &AppState,
    input: &QueryComputeMetricsInput,
) -> Result<MetricsResponse, CoreError> {
    if input.instance_id.trim().is_empty() {
        return Err(CoreError::RequiredInputMissing("instance_id"));
    }
    if input.metric_name.trim().is_empty() {
        return Err(CoreError::RequiredInputMissing("metric_name"));
    }

    let scope = state.resolve_scope(input.compartment_id.as_deref())?;
    let now = state.clock.now();
    let start_time = parse_time_expression(&input.start_time, now)?;
    let end_time = match input.end_time.as_deref() {
        Some(end) => parse_absolute_time(end)?,
        None => now,
    };

    let mut dimensions = StringMap::new();
    dimensions.insert("resourceId".to_string(), input.instance_id.clone());

    let request = MetricRequest {
        namespace: COMPUTE_AGENT_NAMESPACE.to_string(),
        metric_name: input.metric_name.clone(),
        start_time,
        end_time,
        compartment_id: scope.clone(),
        dimensions,
    };

    info!(
        instance_id = %input.instance_id,
        metric = %input.metric_name,
        start = %start_time,
        end = %end_time,
        "Querying compute metrics"
    );
    let metrics = state.adapter.query_metric_series(&request).await?;

    Ok(MetricsResponse {
        metrics,
        query: MetricQueryEcho {
            instance_id: input.instance_id.clone(),
            metric_name: request.metric_name,
            namespace: request.namespace,
            start_time,
            end_time,
            compartment_id: scope,
        },
        method: Method::Sdk,
        logan_compatible: true,
        retrieved_at: now,
        service: "OCI Monitoring",
        operation_type: "query_compute_metrics",
        success: true,
    })
}
