//! MCP Resources for OCI
//!
//! Resources expose read-only data that can be fetched by URI.

use std::sync::Arc;

use tower_mcp::protocol::{ReadResourceResult, ResourceContent};
use tower_mcp::resource::{Resource, ResourceBuilder};

use crate::state::AppState;

/// Build a resource exposing the OCI config file location
pub fn config_path_resource(state: Arc<AppState>) -> Resource {
    ResourceBuilder::new("oci://config/path")
        .name("Configuration Path")
        .description("Path to the OCI config file read at startup")
        .mime_type("text/plain")
        .handler(move || {
            let state = state.clone();
            async move {
                let path = state
                    .config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(no config path available)".to_string());

                Ok(ReadResourceResult {
                    contents: vec![ResourceContent {
                        uri: "oci://config/path".to_string(),
                        mime_type: Some("text/plain".to_string()),
                        text: Some(path),
                        blob: None,
                        meta: None,
                    }],
                    meta: None,
                })
            }
        })
        .build()
}

/// Build a resource exposing the adapter mode and defaults
pub fn status_resource(state: Arc<AppState>) -> Resource {
    ResourceBuilder::new("oci://status")
        .name("Status")
        .description("Whether the OCI API clients are initialized, region and default compartment")
        .mime_type("application/json")
        .handler(move || {
            let state = state.clone();
            async move {
                let adapter = &state.adapter;
                let status = serde_json::json!({
                    "mode": if adapter.has_compute() { "sdk" } else { "cli" },
                    "config_loaded": adapter.has_config(),
                    "region": adapter.region(),
                    "default_compartment": adapter.get_default_scope(),
                    "clients": {
                        "compute": adapter.has_compute(),
                        "network": adapter.has_network(),
                        "monitoring": adapter.has_monitoring()
                    }
                })
                .to_string();

                Ok(ReadResourceResult {
                    contents: vec![ResourceContent {
                        uri: "oci://status".to_string(),
                        mime_type: Some("application/json".to_string()),
                        text: Some(status),
                        blob: None,
                        meta: None,
                    }],
                    meta: None,
                })
            }
        })
        .build()
}

/// Build a resource exposing server usage help
pub fn help_resource() -> Resource {
    ResourceBuilder::new("oci://help")
        .name("Help")
        .description("Usage instructions for the OCI MCP server")
        .mime_type("text/markdown")
        .text(
            r#"# OCI MCP Server Help

## Tools

### Compute
- **list_compute_instances**: instances in a compartment by lifecycle state
- **list_instances_with_network**: instances with primary private/public IP and hostname
- **get_instance_details**: full configuration of one instance

### Monitoring
- **query_compute_metrics**: one-minute means of an `oci_computeagent` metric

### Diagnostics
- **test_oci_connection**: configuration, compute and monitoring checks

## Data Sources

Requests go to the OCI API using the profile in `~/.oci/config`. When the
config cannot be loaded, `list_compute_instances` and
`list_instances_with_network` fall back to the `oci` CLI; the other tools
report a failure.

Every response carries `method` (`SDK`, `CLI`, `CLI (limited)` or `Error`)
and `success`.

## Compartment

Tools accept `compartment_id`. Without it, `OCI_COMPARTMENT_ID` is used, then
the tenancy from the config file.

## Time Ranges

`start_time` accepts `24h`, `7d` or an ISO-8601 timestamp. `end_time` accepts
only ISO-8601 and defaults to now.

## Prompts

- `investigate_instance_performance` - Metric-driven look at one instance
- `fleet_overview` - Inventory and network overview of a compartment

## Resources

- `oci://config/path` - Config file location
- `oci://status` - Adapter mode, region and default compartment
- `oci://help` - This help text
"#,
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use oci_mcp_core::ProviderAdapter;

    #[tokio::test]
    async fn test_help_resource() {
        let resource = help_resource();
        assert_eq!(resource.uri, "oci://help");
        assert_eq!(resource.name, "Help");

        let result = resource.read().await;
        assert_eq!(result.contents.len(), 1);
        assert!(
            result.contents[0]
                .text
                .as_ref()
                .unwrap()
                .contains("OCI MCP Server")
        );
    }

    #[tokio::test]
    async fn test_config_path_resource() {
        let state = Arc::new(
            AppState::with_adapter(ProviderAdapter::builder().build())
                .with_config_file("/srv/oci/config"),
        );
        let resource = config_path_resource(state);
        assert_eq!(resource.uri, "oci://config/path");

        let result = resource.read().await;
        assert_eq!(result.contents[0].text.as_deref(), Some("/srv/oci/config"));
    }

    #[tokio::test]
    async fn test_status_resource_degraded() {
        let adapter = ProviderAdapter::builder()
            .compartment_override(Some("ocid1.compartment.oc1..c".to_string()))
            .build();
        let resource = status_resource(Arc::new(AppState::with_adapter(adapter)));

        let result = resource.read().await;
        let text = result.contents[0].text.as_ref().unwrap();
        let status: serde_json::Value = serde_json::from_str(text).unwrap();

        assert_eq!(status["mode"], "cli");
        assert_eq!(status["config_loaded"], false);
        assert!(status["region"].is_null());
        assert_eq!(status["default_compartment"], "ocid1.compartment.oc1..c");
        assert_eq!(status["clients"]["monitoring"], false);
    }
}
