//! Per-operation failure handling

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a failed operation does to its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The error is returned to the caller
    Propagate,
    /// The error is logged and an empty result returned
    BestEffort,
}

/// Logical operations the adapter exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ListInstances,
    GetInstanceDetails,
    ListNetworkAttachments,
    GetNetworkInterface,
    QueryMetricSeries,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::ListInstances,
        Operation::GetInstanceDetails,
        Operation::ListNetworkAttachments,
        Operation::GetNetworkInterface,
        Operation::QueryMetricSeries,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ListInstances => "list_instances",
            Operation::GetInstanceDetails => "get_instance_details",
            Operation::ListNetworkAttachments => "list_network_attachments",
            Operation::GetNetworkInterface => "get_network_interface",
            Operation::QueryMetricSeries => "query_metric_series",
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        match self {
            Operation::ListNetworkAttachments | Operation::GetNetworkInterface => {
                FailurePolicy::BestEffort
            }
            Operation::ListInstances
            | Operation::GetInstanceDetails
            | Operation::QueryMetricSeries => FailurePolicy::Propagate,
        }
    }

    /// Whether the `oci` CLI can serve this operation when the API cannot
    pub fn has_cli_fallback(&self) -> bool {
        matches!(self, Operation::ListInstances)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_policy_per_operation() {
        assert_eq!(
            Operation::ListInstances.failure_policy(),
            FailurePolicy::Propagate
        );
        assert_eq!(
            Operation::GetInstanceDetails.failure_policy(),
            FailurePolicy::Propagate
        );
        assert_eq!(
            Operation::ListNetworkAttachments.failure_policy(),
            FailurePolicy::BestEffort
        );
        assert_eq!(
            Operation::GetNetworkInterface.failure_policy(),
            FailurePolicy::BestEffort
        );
        assert_eq!(
            Operation::QueryMetricSeries.failure_policy(),
            FailurePolicy::Propagate
        );
    }

    #[test]
    fn test_only_listing_falls_back_to_cli() {
        let with_fallback: Vec<_> = Operation::ALL
            .iter()
            .filter(|op| op.has_cli_fallback())
            .collect();
        assert_eq!(with_fallback, vec![&Operation::ListInstances]);
    }

    #[test]
    fn test_display_matches_serde() {
        for op in Operation::ALL {
            let json = serde_json::to_value(op).unwrap();
            assert_eq!(json, op.to_string());
        }
    }
}
