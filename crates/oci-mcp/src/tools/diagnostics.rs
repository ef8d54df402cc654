//! Connectivity diagnostics, plus the server's resources and prompts

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use oci_mcp_core::LifecycleState;
use schemars::JsonSchema;
use serde::Deserialize;
use tower_mcp::extract::{Json, State};
use tower_mcp::{CallToolResult, McpRouter, Tool, ToolBuilder};
use tracing::{error, info};

use crate::envelope::{
    CheckResult, CheckStatus, ConnectionFailure, ConnectionReport, ConnectionTests,
};
use crate::state::AppState;

/// Longest provider error echoed back in the compute check
const ERROR_PREVIEW_CHARS: usize = 100;

const INSTRUCTIONS: &str = "\
### Diagnostics\n\
- test_oci_connection: Check configuration, compute and monitoring access\n\
\n\
### Resources\n\
- oci://config/path: OCI config file location\n\
- oci://status: Adapter mode, region and default compartment\n\
- oci://help: Usage help\n\
\n\
### Prompts\n\
- investigate_instance_performance: Metric-driven look at one instance\n\
- fleet_overview: Inventory and network overview of a compartment\n\
";

/// Instructions text describing the diagnostics tool, resources, and prompts
pub fn instructions() -> &'static str {
    INSTRUCTIONS
}

/// Build an MCP sub-router with the diagnostics tool, resources, and prompts
pub fn router(state: Arc<AppState>) -> McpRouter {
    McpRouter::new()
        .tool(test_oci_connection(state.clone()))
        // Resources
        .resource(crate::resources::config_path_resource(state.clone()))
        .resource(crate::resources::status_resource(state))
        .resource(crate::resources::help_resource())
        // Prompts
        .prompt(crate::prompts::investigate_instance_performance_prompt())
        .prompt(crate::prompts::fleet_overview_prompt())
}

/// Input for test_oci_connection (no parameters)
#[derive(Debug, Deserialize, JsonSchema)]
pub struct TestConnectionInput {}

/// Build the test_oci_connection tool
pub fn test_oci_connection(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("test_oci_connection")
        .description(
            "Test OCI connectivity: whether the SDK configuration loaded, whether the compute \
             service answers, and whether the monitoring client is available.",
        )
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, TestConnectionInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(_input): Json<TestConnectionInput>| async move {
                match AssertUnwindSafe(run_checks(&state)).catch_unwind().await {
                    Ok(report) => CallToolResult::from_serialize(&report),
                    Err(panic) => {
                        let message = panic_message(&*panic);
                        error!(error = %message, "Connection test failed");
                        CallToolResult::from_serialize(&ConnectionFailure::new(
                            message,
                            state.clock.now(),
                        ))
                    }
                }
            },
        )
        .build()
}

/// Run the three checks against the adapter
pub async fn run_checks(state: &AppState) -> ConnectionReport {
    let tests = ConnectionTests {
        sdk_config: check_config(state),
        compute_service: check_compute(state).await,
        monitoring_service: check_monitoring(state),
    };
    let report = ConnectionReport::new(state.clock.now(), tests);
    info!(status = ?report.overall_status, "{}", report.message);
    report
}

fn check_config(state: &AppState) -> CheckResult {
    match state.adapter.config() {
        Some(config) => CheckResult {
            region: Some(config.region.clone()),
            tenancy: Some(config.tenancy_preview()),
            ..CheckResult::new(CheckStatus::Success, "OCI SDK configuration loaded")
        },
        None => CheckResult::new(CheckStatus::Failed, "OCI SDK configuration not available"),
    }
}

async fn check_compute(state: &AppState) -> CheckResult {
    let adapter = &state.adapter;
    if !adapter.has_compute() {
        return CheckResult::new(CheckStatus::Failed, "Compute client not available");
    }

    let Some(scope) = adapter.get_default_scope() else {
        return CheckResult::new(
            CheckStatus::Warning,
            "Compute client available but no compartment ID configured",
        );
    };

    match adapter
        .list_instances_sdk(&scope, LifecycleState::Running)
        .await
    {
        Ok(instances) => CheckResult {
            instance_count: Some(instances.len()),
            ..CheckResult::new(
                CheckStatus::Success,
                format!(
                    "Compute service accessible - found {} running instances",
                    instances.len()
                ),
            )
        },
        Err(e) => {
            let preview: String = e.to_string().chars().take(ERROR_PREVIEW_CHARS).collect();
            CheckResult::new(
                CheckStatus::Failed,
                format!("Compute service test failed: {}...", preview),
            )
        }
    }
}

fn check_monitoring(state: &AppState) -> CheckResult {
    if state.adapter.has_monitoring() {
        CheckResult::new(CheckStatus::Success, "Monitoring client available")
    } else {
        CheckResult::new(CheckStatus::Failed, "Monitoring client not available")
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_payloads() {
        let boxed: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(&*boxed), "static message");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(&*boxed), "owned message");

        let boxed: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(&*boxed), "unknown panic");
    }
}
