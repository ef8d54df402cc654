//! Transports that reach the provider
//!
//! Two implementations answer the same logical questions: the signed REST
//! client in [`rest`] and the `oci` command-line tool in [`cli`]. Listing
//! instances is the one operation both can serve, so it lives in its own
//! trait, [`InstanceSource`]. Everything else is REST-only.

pub mod cli;
pub mod rest;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    Instance, InstanceDetails, LifecycleState, NetworkAttachment, NetworkInterface, StringMap,
};

/// Which transport served (or failed) a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportKind {
    /// Signed REST calls to the OCI API
    Api,
    /// The `oci` command-line tool
    Cli,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Api => f.write_str("OCI API"),
            TransportKind::Cli => f.write_str("OCI CLI"),
        }
    }
}

/// Something that can list compute instances
#[async_trait]
pub trait InstanceSource: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// First page of instances in `compartment_id` with the given state
    async fn list_instances(
        &self,
        compartment_id: &str,
        lifecycle_state: LifecycleState,
    ) -> Result<Vec<Instance>>;
}

/// Compute service operations beyond listing
#[async_trait]
pub trait ComputeApi: InstanceSource {
    async fn get_instance(&self, instance_id: &str) -> Result<InstanceDetails>;

    async fn list_vnic_attachments(
        &self,
        compartment_id: &str,
        instance_id: &str,
    ) -> Result<Vec<NetworkAttachment>>;
}

/// Virtual network service operations
#[async_trait]
pub trait NetworkApi: Send + Sync {
    async fn get_vnic(&self, vnic_id: &str) -> Result<NetworkInterface>;
}

/// Monitoring service operations
#[async_trait]
pub trait MonitoringApi: Send + Sync {
    async fn summarize_metrics(&self, query: &MetricQuery) -> Result<Vec<MetricData>>;
}

/// A summarizeMetricsData request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricQuery {
    #[serde(skip)]
    pub compartment_id: String,
    pub namespace: String,
    /// MQL expression, e.g. `CpuUtilization{resourceId="..."}[1m].mean()`
    pub query: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub resolution: String,
}

/// One metric stream from a summarizeMetricsData response
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricData {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub dimensions: StringMap,
    #[serde(default)]
    pub aggregated_datapoints: Vec<Datapoint>,
}

/// One aggregated sample
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Datapoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}
