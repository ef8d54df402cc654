//! MCP tools for OCI compute, monitoring, and connectivity diagnostics
//!
//! Tool handlers never return a protocol error for provider failures. Every
//! failure is turned into a failure envelope (`success: false`) so the caller
//! always gets a structured answer.

pub mod compute;
pub mod diagnostics;
pub mod monitoring;

use oci_mcp_core::CoreError;

/// Append remediation guidance to a failure summary.
///
/// Only configuration and scope problems get suggestions; transport errors
/// are reported as-is.
pub fn with_remediation(summary: String, err: &CoreError) -> String {
    match remediation(err) {
        Some(guidance) => format!("{}\n\n{}", summary, guidance),
        None => summary,
    }
}

/// Structured remediation guidance for an LLM caller
pub fn remediation(err: &CoreError) -> Option<String> {
    let mut output = String::new();

    match err {
        CoreError::RequiredInputMissing("compartment_id") => {
            output.push_str("No compartment ID available.\n\n");
            output.push_str("Suggested actions:\n");
            output.push_str("- Pass the 'compartment_id' parameter\n");
            output.push_str("- Set OCI_COMPARTMENT_ID before starting the server\n");
            output.push_str(
                "- Configure ~/.oci/config so the tenancy can be used as the default scope\n",
            );
        }
        CoreError::ConfigurationUnavailable(_) | CoreError::UnsupportedFallback(_) => {
            output.push_str("OCI API clients are not initialized.\n\n");
            output.push_str("Suggested actions:\n");
            output.push_str("- Call test_oci_connection to see which services are reachable\n");
            output.push_str("- Run 'oci setup config' to create ~/.oci/config\n");
            output.push_str("- Check that key_file in the profile points to a readable key\n");
        }
        _ => return None,
    }

    Some(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oci_mcp_core::{Operation, TransportKind};

    #[test]
    fn test_remediation_for_missing_compartment() {
        let guidance = remediation(&CoreError::RequiredInputMissing("compartment_id")).unwrap();
        assert!(guidance.contains("Suggested actions:"));
        assert!(guidance.contains("OCI_COMPARTMENT_ID"));
    }

    #[test]
    fn test_remediation_for_missing_clients() {
        let err = CoreError::UnsupportedFallback(Operation::QueryMetricSeries);
        let summary = with_remediation("Failed".to_string(), &err);
        assert!(summary.starts_with("Failed\n\n"));
        assert!(summary.contains("test_oci_connection"));
    }

    #[test]
    fn test_no_remediation_for_transport_errors() {
        let err = CoreError::transport(TransportKind::Cli, "CLI command failed: boom");
        assert!(remediation(&err).is_none());
        assert_eq!(with_remediation("Failed".to_string(), &err), "Failed");
    }
}
