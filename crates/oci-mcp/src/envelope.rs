//! Response envelopes returned by the tools
//!
//! Every tool answers with one of these shapes, on success and on failure
//! alike. The listing tools use snake_case keys; the detail and metric tools
//! use camelCase to stay compatible with Logging Analytics ingestion.

use chrono::{DateTime, Utc};
use oci_mcp_core::{Instance, InstanceDetails, MetricSeries, TransportKind};
use serde::Serialize;

/// Which path produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Method {
    #[serde(rename = "SDK")]
    Sdk,
    #[serde(rename = "CLI")]
    Cli,
    /// CLI listing with network fields left empty
    #[serde(rename = "CLI (limited)")]
    CliLimited,
    #[serde(rename = "Error")]
    Error,
}

impl Method {
    /// Human-readable transport name used in summaries
    pub fn label(&self) -> &'static str {
        match self {
            Method::Sdk => "OCI API",
            Method::Cli => "OCI CLI",
            Method::CliLimited => "OCI CLI (limited)",
            Method::Error => "Error",
        }
    }
}

impl From<TransportKind> for Method {
    fn from(kind: TransportKind) -> Self {
        match kind {
            TransportKind::Api => Method::Sdk,
            TransportKind::Cli => Method::Cli,
        }
    }
}

/// Result of the two instance listing tools
#[derive(Debug, Clone, Serialize)]
pub struct InstanceListing {
    pub summary: String,
    pub instance_count: usize,
    pub instances: Vec<Instance>,
    /// Only reported by `list_instances_with_network`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub includes_network_info: Option<bool>,
    pub method: Method,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstanceListing {
    pub fn success(summary: String, instances: Vec<Instance>, method: Method) -> Self {
        Self {
            summary,
            instance_count: instances.len(),
            instances,
            includes_network_info: None,
            method,
            success: true,
            error: None,
        }
    }

    pub fn failure(summary: String, error: String) -> Self {
        Self {
            summary,
            instance_count: 0,
            instances: Vec::new(),
            includes_network_info: None,
            method: Method::Error,
            success: false,
            error: Some(error),
        }
    }

    pub fn with_network_flag(mut self, included: bool) -> Self {
        self.includes_network_info = Some(included);
        self
    }
}

/// Uniform failure shape for the detail and metric tools
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub error: String,
    pub success: bool,
    pub retrieved_at: DateTime<Utc>,
}

impl Failure {
    pub fn new(error: impl Into<String>, retrieved_at: DateTime<Utc>) -> Self {
        Self {
            error: error.into(),
            success: false,
            retrieved_at,
        }
    }
}

/// Success payload of `get_instance_details`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceDetailsResponse {
    pub instance: InstanceDetails,
    pub includes_network_info: bool,
    pub method: Method,
    pub logan_compatible: bool,
    pub retrieved_at: DateTime<Utc>,
    pub service: &'static str,
    pub operation_type: &'static str,
    pub success: bool,
}

/// The query as executed, echoed back with the metrics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricQueryEcho {
    pub instance_id: String,
    pub metric_name: String,
    pub namespace: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub compartment_id: String,
}

/// Success payload of `query_compute_metrics`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub metrics: MetricSeries,
    pub query: MetricQueryEcho,
    pub method: Method,
    pub logan_compatible: bool,
    pub retrieved_at: DateTime<Utc>,
    pub service: &'static str,
    pub operation_type: &'static str,
    pub success: bool,
}

/// Outcome of one connectivity check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Success,
    Warning,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenancy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_count: Option<usize>,
}

impl CheckResult {
    pub fn new(status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            region: None,
            tenancy: None,
            instance_count: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionTests {
    pub sdk_config: CheckResult,
    pub compute_service: CheckResult,
    pub monitoring_service: CheckResult,
}

impl ConnectionTests {
    fn all(&self) -> [&CheckResult; 3] {
        [&self.sdk_config, &self.compute_service, &self.monitoring_service]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Success,
    Partial,
    Failed,
}

/// Result of `test_oci_connection`
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReport {
    pub timestamp: DateTime<Utc>,
    pub service: &'static str,
    pub tests: ConnectionTests,
    pub overall_status: OverallStatus,
    pub message: String,
}

impl ConnectionReport {
    /// Roll the individual checks up into an overall status
    pub fn new(timestamp: DateTime<Utc>, tests: ConnectionTests) -> Self {
        let total = tests.all().len();
        let failed = tests
            .all()
            .iter()
            .filter(|t| t.status == CheckStatus::Failed)
            .count();

        let (overall_status, message) = match failed {
            0 => (OverallStatus::Success, "All OCI services accessible".to_string()),
            f if f < total => (
                OverallStatus::Partial,
                format!("{} out of {} tests failed", f, total),
            ),
            f => (
                OverallStatus::Failed,
                format!("{} out of {} tests failed", f, total),
            ),
        };

        Self {
            timestamp,
            service: "OCI Connection Test",
            tests,
            overall_status,
            message,
        }
    }
}

/// Reported when the connection checks themselves blow up
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionFailure {
    pub overall_status: OverallStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub error: String,
}

impl ConnectionFailure {
    pub fn new(error: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            overall_status: OverallStatus::Failed,
            message: format!("Connection test failed: {}", error),
            timestamp,
            error,
        }
    }
}
