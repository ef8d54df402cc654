//! MCP Prompts for OCI operations workflows
//!
//! Prompts provide pre-built templates that chain the server's tools.

use std::collections::HashMap;

use tower_mcp::prompt::{Prompt, PromptBuilder};
use tower_mcp::protocol::{Content, GetPromptResult, PromptMessage, PromptRole};

/// Build a prompt for investigating one instance's performance
pub fn investigate_instance_performance_prompt() -> Prompt {
    PromptBuilder::new("investigate_instance_performance")
        .description("Investigate CPU, memory and network behaviour of one compute instance")
        .required_arg("instance_id", "OCID of the instance to investigate")
        .optional_arg(
            "time_range",
            "How far back to look, e.g. 24h or 7d (default: 24h)",
        )
        .handler(|args: HashMap<String, String>| async move {
            let instance_id = args.get("instance_id").cloned().unwrap_or_default();
            let time_range = args
                .get("time_range")
                .filter(|t| !t.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| "24h".to_string());

            let prompt_text = format!(
                r#"I need to investigate the performance of the OCI compute instance "{instance_id}" over the last {time_range}.

Please help me by:

1. Call get_instance_details with instance_id="{instance_id}" to learn its shape, placement and network interfaces
2. Call query_compute_metrics with metric_name="CpuUtilization" and start_time="{time_range}"
3. Call query_compute_metrics with metric_name="MemoryUtilization" and start_time="{time_range}"
4. Call query_compute_metrics with metric_name="NetworksBytesIn" and then "NetworksBytesOut" for the same range
5. If any call fails with method "Error", call test_oci_connection to see which services are reachable

Based on the results, summarize:
- Peak and average utilization for each metric
- Whether the shape looks over- or under-provisioned
- Any anomalies worth a closer look, with their timestamps"#
            );

            Ok(GetPromptResult {
                description: Some(format!("Investigate instance: {}", instance_id)),
                messages: vec![PromptMessage {
                    role: PromptRole::User,
                    content: Content::Text {
                        text: prompt_text,
                        annotations: None,
                        meta: None,
                    },
                    meta: None,
                }],
                meta: None,
            })
        })
        .build()
}

/// Build a prompt for a compartment-wide fleet overview
pub fn fleet_overview_prompt() -> Prompt {
    PromptBuilder::new("fleet_overview")
        .description("Summarize the compute fleet of a compartment")
        .optional_arg(
            "compartment_id",
            "Compartment OCID (default: the server's configured compartment)",
        )
        .handler(|args: HashMap<String, String>| async move {
            let compartment = args
                .get("compartment_id")
                .filter(|c| !c.trim().is_empty())
                .cloned();

            let scope_hint = match &compartment {
                Some(id) => format!(" with compartment_id=\"{}\"", id),
                None => String::new(),
            };

            let prompt_text = format!(
                r#"I need an overview of the compute fleet{scope_note}.

Please help me by:

1. Call test_oci_connection to confirm which OCI services are reachable
2. Call list_compute_instances{scope_hint} for RUNNING instances
3. Call list_compute_instances{scope_hint} with lifecycle_state="STOPPED"
4. Call list_instances_with_network{scope_hint} to collect private and public IPs

Then provide:
- Instance counts by state and by shape
- Which instances are publicly reachable
- Stopped instances that may be candidates for cleanup"#,
                scope_note = compartment
                    .as_deref()
                    .map(|id| format!(" in compartment {}", id))
                    .unwrap_or_default(),
            );

            Ok(GetPromptResult {
                description: Some("OCI compute fleet overview".to_string()),
                messages: vec![PromptMessage {
                    role: PromptRole::User,
                    content: Content::Text {
                        text: prompt_text,
                        annotations: None,
                        meta: None,
                    },
                    meta: None,
                }],
                meta: None,
            })
        })
        .build()
}
