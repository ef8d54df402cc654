//! Provider client adapter
//!
//! [`ProviderAdapter`] is built once at startup and only read afterwards. It
//! holds up to three REST clients (compute, network, monitoring) and the CLI
//! runner, and decides per operation which one serves a request:
//!
//! | Operation                  | Transport        | On failure        |
//! |----------------------------|------------------|-------------------|
//! | `list_instances`           | API, then CLI    | propagate         |
//! | `get_instance_details`     | API only         | propagate         |
//! | `list_network_attachments` | API only         | empty list        |
//! | `get_network_interface`    | API only         | `None`            |
//! | `query_metric_series`      | API only         | propagate         |
//!
//! When the config file cannot be loaded the adapter starts in degraded mode
//! with no REST clients; only the CLI listing path works.

mod policy;
mod settings;

pub use policy::{FailurePolicy, Operation};
pub use settings::{AdapterSettings, DEFAULT_API_TIMEOUT};

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::config::OciConfig;
use crate::error::{CoreError, Result};
use crate::model::{
    Instance, InstanceDetails, LifecycleState, MetricPoint, MetricSeries, NetworkAttachment,
    NetworkInfo, NetworkInterface, StringMap,
};
use crate::transport::cli::OciCli;
use crate::transport::rest::{
    ApiKeySigner, ComputeClient, Endpoints, MonitoringClient, RestClient, VirtualNetworkClient,
};
use crate::transport::{
    ComputeApi, InstanceSource, MetricQuery, MonitoringApi, NetworkApi, TransportKind,
};

/// Aggregation window used for every metric query
pub const METRIC_RESOLUTION: &str = "PT1M";

/// Instances enriched at the same time by `list_instances_with_network`
pub const ENRICHMENT_CONCURRENCY: usize = 8;

/// A result tagged with the transport that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub transport: TransportKind,
    pub value: T,
}

/// Parameters of a metric series query
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRequest {
    pub namespace: String,
    pub metric_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub compartment_id: String,
    /// Equality filters, rendered in key order
    pub dimensions: StringMap,
}

/// Build an MQL expression: `<metric>{k="v", ...}[1m].mean()`
///
/// ```rust
/// use oci_mcp_core::adapter::build_mql;
/// use oci_mcp_core::model::StringMap;
///
/// let mut dims = StringMap::new();
/// dims.insert("resourceId".to_string(), "ocid1.instance.oc1..a".to_string());
/// assert_eq!(
///     build_mql("CpuUtilization", &dims),
///     r#"CpuUtilization{resourceId="ocid1.instance.oc1..a"}[1m].mean()"#
/// );
/// assert_eq!(build_mql("DiskBytesRead", &StringMap::new()), "DiskBytesRead[1m].mean()");
/// ```
pub fn build_mql(metric_name: &str, dimensions: &StringMap) -> String {
    let filter = if dimensions.is_empty() {
        String::new()
    } else {
        let pairs: Vec<String> = dimensions
            .iter()
            .map(|(key, value)| format!("{}={}", key, quote_mql(value)))
            .collect();
        format!("{{{}}}", pairs.join(", "))
    };
    format!("{}{}[1m].mean()", metric_name, filter)
}

/// Dimension values are double-quoted with `\` and `"` escaped.
fn quote_mql(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Metric names are bare MQL identifiers.
fn validate_metric_name(metric_name: &str) -> Result<()> {
    let valid = !metric_name.is_empty()
        && metric_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(CoreError::MalformedInput(format!(
            "Invalid metric name: '{metric_name}'"
        )))
    }
}

/// Uniform access to OCI regardless of which transport answers
pub struct ProviderAdapter {
    config: Option<OciConfig>,
    compartment_override: Option<String>,
    compute: Option<Arc<dyn ComputeApi>>,
    network: Option<Arc<dyn NetworkApi>>,
    monitoring: Option<Arc<dyn MonitoringApi>>,
    cli: Arc<dyn InstanceSource>,
}

struct Clients {
    compute: ComputeClient,
    network: VirtualNetworkClient,
    monitoring: MonitoringClient,
}

impl ProviderAdapter {
    pub fn builder() -> ProviderAdapterBuilder {
        ProviderAdapterBuilder::default()
    }

    /// Load configuration and build the REST clients.
    ///
    /// Never fails: a config or key problem is logged and leaves the adapter
    /// in degraded (CLI-only) mode.
    pub fn initialize(settings: &AdapterSettings) -> Self {
        let mut cli = OciCli::new(settings.cli_program.clone(), settings.cli_timeout)
            .with_profile(settings.profile.clone());
        if let Some(path) = &settings.config_file {
            cli = cli.with_config_file(path.clone());
        }

        let builder = Self::builder()
            .cli(Arc::new(cli))
            .compartment_override(settings.compartment_override.clone());

        match Self::connect(settings) {
            Ok((config, clients)) => {
                info!("OCI API clients initialized successfully");
                info!(region = %config.region, "Region");
                info!(tenancy = %config.tenancy_preview(), "Tenancy");
                builder
                    .config(config)
                    .compute(Arc::new(clients.compute))
                    .network(Arc::new(clients.network))
                    .monitoring(Arc::new(clients.monitoring))
                    .build()
            }
            Err(e) => {
                error!(error = %e, "Failed to initialize OCI API clients");
                warn!("Will fall back to OCI CLI commands");
                builder.build()
            }
        }
    }

    fn connect(settings: &AdapterSettings) -> Result<(OciConfig, Clients)> {
        let config = OciConfig::load(settings.config_file.as_deref(), &settings.profile)?;
        let signer = ApiKeySigner::from_config(&config)?;
        let rest = RestClient::new(Arc::new(signer), settings.api_timeout)?;

        let endpoints = match &settings.endpoints {
            Some(endpoints) => endpoints.clone(),
            None => Endpoints::for_region(&config.region)?,
        };

        let clients = Clients {
            compute: ComputeClient::new(rest.clone(), endpoints.iaas.clone(), &config.region),
            network: VirtualNetworkClient::new(rest.clone(), endpoints.iaas),
            monitoring: MonitoringClient::new(rest, endpoints.telemetry),
        };
        Ok((config, clients))
    }

    /// Explicit override, else the tenancy from the loaded config
    pub fn get_default_scope(&self) -> Option<String> {
        self.compartment_override
            .clone()
            .or_else(|| self.config.as_ref().map(|c| c.tenancy.clone()))
    }

    pub fn config(&self) -> Option<&OciConfig> {
        self.config.as_ref()
    }

    pub fn region(&self) -> Option<&str> {
        self.config.as_ref().map(|c| c.region.as_str())
    }

    pub fn has_config(&self) -> bool {
        self.config.is_some()
    }

    pub fn has_compute(&self) -> bool {
        self.compute.is_some()
    }

    pub fn has_network(&self) -> bool {
        self.network.is_some()
    }

    pub fn has_monitoring(&self) -> bool {
        self.monitoring.is_some()
    }

    fn compute_client(&self, op: Operation) -> Result<&Arc<dyn ComputeApi>> {
        self.compute.as_ref().ok_or_else(|| unavailable(op, "compute"))
    }

    /// List instances through the REST API only
    pub async fn list_instances_sdk(
        &self,
        compartment_id: &str,
        lifecycle_state: LifecycleState,
    ) -> Result<Vec<Instance>> {
        self.compute_client(Operation::ListInstances)?
            .list_instances(compartment_id, lifecycle_state)
            .await
    }

    /// List instances through the CLI only
    pub async fn list_instances_cli(
        &self,
        compartment_id: &str,
        lifecycle_state: LifecycleState,
    ) -> Result<Vec<Instance>> {
        self.cli.list_instances(compartment_id, lifecycle_state).await
    }

    /// List instances, preferring the API and falling back to the CLI
    pub async fn list_instances(
        &self,
        compartment_id: &str,
        lifecycle_state: LifecycleState,
    ) -> Result<Sourced<Vec<Instance>>> {
        let op = Operation::ListInstances;

        if let Some(compute) = &self.compute {
            match compute.list_instances(compartment_id, lifecycle_state).await {
                Ok(value) => {
                    return Ok(Sourced {
                        transport: compute.kind(),
                        value,
                    });
                }
                Err(e) if op.has_cli_fallback() => {
                    warn!(error = %e, "API listing failed, trying CLI");
                }
                Err(e) => return Err(e),
            }
        }

        let value = self.list_instances_cli(compartment_id, lifecycle_state).await?;
        Ok(Sourced {
            transport: self.cli.kind(),
            value,
        })
    }

    /// Full configuration of one instance; API only
    pub async fn get_instance_details(&self, instance_id: &str) -> Result<InstanceDetails> {
        self.compute_client(Operation::GetInstanceDetails)?
            .get_instance(instance_id)
            .await
    }

    /// VNIC attachments of an instance; empty on any failure
    pub async fn list_network_attachments(
        &self,
        instance_id: &str,
        compartment_id: &str,
    ) -> Vec<NetworkAttachment> {
        let op = Operation::ListNetworkAttachments;
        absorb(op, async {
            self.compute_client(op)?
                .list_vnic_attachments(compartment_id, instance_id)
                .await
        })
        .await
    }

    /// One VNIC; `None` on any failure
    pub async fn get_network_interface(&self, vnic_id: &str) -> Option<NetworkInterface> {
        let op = Operation::GetNetworkInterface;
        absorb(op, async {
            let network = self
                .network
                .as_ref()
                .ok_or_else(|| unavailable(op, "network"))?;
            network.get_vnic(vnic_id).await.map(Some)
        })
        .await
    }

    /// Network summary for every VNIC attached to an instance.
    ///
    /// Attachments without a VNIC yet and VNICs that cannot be read are
    /// skipped. Fails only when the network client is missing.
    pub async fn network_info(
        &self,
        instance_id: &str,
        compartment_id: &str,
    ) -> Result<Vec<NetworkInfo>> {
        if self.network.is_none() {
            return Err(unavailable(Operation::GetNetworkInterface, "network"));
        }

        let mut network_info = Vec::new();
        for attachment in self
            .list_network_attachments(instance_id, compartment_id)
            .await
        {
            let Some(vnic_id) = attachment.vnic_id.as_deref() else {
                continue;
            };
            if let Some(vnic) = self.get_network_interface(vnic_id).await {
                network_info.push(NetworkInfo::new(&vnic, &attachment));
            }
        }
        Ok(network_info)
    }

    /// API listing with per-instance network enrichment.
    ///
    /// At most [`ENRICHMENT_CONCURRENCY`] instances are enriched at once and
    /// results keep the listing order. One that cannot be enriched keeps
    /// empty network fields and the batch continues.
    pub async fn list_instances_with_network(
        &self,
        compartment_id: &str,
        lifecycle_state: LifecycleState,
    ) -> Result<Vec<Instance>> {
        let instances = self
            .list_instances_sdk(compartment_id, lifecycle_state)
            .await?;

        let enriched = stream::iter(instances).map(|mut instance| async move {
            match self.network_info(&instance.id, compartment_id).await {
                Ok(network_info) => instance.attach_network(network_info),
                Err(e) => {
                    warn!(
                        instance_id = %instance.id,
                        error = %e,
                        "Failed to get network info for instance"
                    );
                    instance.clear_network();
                }
            }
            instance
        });

        Ok(enriched.buffered(ENRICHMENT_CONCURRENCY).collect().await)
    }

    /// Run a metric query and flatten the result into one ordered series
    pub async fn query_metric_series(&self, request: &MetricRequest) -> Result<MetricSeries> {
        validate_metric_name(&request.metric_name)?;
        let monitoring = self
            .monitoring
            .as_ref()
            .ok_or(CoreError::UnsupportedFallback(Operation::QueryMetricSeries))?;

        let query = MetricQuery {
            compartment_id: request.compartment_id.clone(),
            namespace: request.namespace.clone(),
            query: build_mql(&request.metric_name, &request.dimensions),
            start_time: request.start_time,
            end_time: request.end_time,
            resolution: METRIC_RESOLUTION.to_string(),
        };

        let data = monitoring.summarize_metrics(&query).await?;
        let aggregated_datapoints = data
            .into_iter()
            .flat_map(|metric| metric.aggregated_datapoints)
            .map(|point| MetricPoint {
                timestamp: point.timestamp,
                value: point.value,
                dimensions: request.dimensions.clone(),
            })
            .collect();

        Ok(MetricSeries {
            namespace: request.namespace.clone(),
            metric_name: request.metric_name.clone(),
            dimensions: request.dimensions.clone(),
            aggregated_datapoints,
            retrieved_at: Utc::now(),
        })
    }
}

fn unavailable(op: Operation, client: &str) -> CoreError {
    if op.has_cli_fallback() {
        CoreError::ConfigurationUnavailable(format!("OCI {} client not available", client))
    } else {
        CoreError::UnsupportedFallback(op)
    }
}

async fn absorb<T, F>(op: Operation, fut: F) -> T
where
    T: Default,
    F: Future<Output = Result<T>>,
{
    debug_assert_eq!(op.failure_policy(), FailurePolicy::BestEffort);
    fut.await.unwrap_or_else(|e| {
        warn!(operation = %op, error = %e, "Best-effort operation failed");
        T::default()
    })
}

/// Builder for [`ProviderAdapter`], mainly for wiring in custom transports
#[derive(Default)]
pub struct ProviderAdapterBuilder {
    config: Option<OciConfig>,
    compartment_override: Option<String>,
    compute: Option<Arc<dyn ComputeApi>>,
    network: Option<Arc<dyn NetworkApi>>,
    monitoring: Option<Arc<dyn MonitoringApi>>,
    cli: Option<Arc<dyn InstanceSource>>,
}

impl ProviderAdapterBuilder {
    pub fn config(mut self, config: OciConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Empty strings are treated as unset
    pub fn compartment_override(mut self, compartment_id: Option<String>) -> Self {
        self.compartment_override = compartment_id.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn compute(mut self, compute: Arc<dyn ComputeApi>) -> Self {
        self.compute = Some(compute);
        self
    }

    pub fn network(mut self, network: Arc<dyn NetworkApi>) -> Self {
        self.network = Some(network);
        self
    }

    pub fn monitoring(mut self, monitoring: Arc<dyn MonitoringApi>) -> Self {
        self.monitoring = Some(monitoring);
        self
    }

    pub fn cli(mut self, cli: Arc<dyn InstanceSource>) -> Self {
        self.cli = Some(cli);
        self
    }

    pub fn build(self) -> ProviderAdapter {
        ProviderAdapter {
            config: self.config,
            compartment_override: self.compartment_override,
            compute: self.compute,
            network: self.network,
            monitoring: self.monitoring,
            cli: self.cli.unwrap_or_else(|| Arc::new(OciCli::default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    /// Compute fake whose attachment lookups are slow and tracked while in flight
    #[derive(Default)]
    struct SlowAttachments {
        instances: usize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl InstanceSource for SlowAttachments {
        fn kind(&self) -> TransportKind {
            TransportKind::Api
        }

        async fn list_instances(
            &self,
            _compartment_id: &str,
            _lifecycle_state: LifecycleState,
        ) -> Result<Vec<Instance>> {
            Ok((0..self.instances)
                .map(|i| Instance {
                    id: format!("ocid1.instance.oc1..{i}"),
                    ..Default::default()
                })
                .collect())
        }
    }

    #[async_trait]
    impl ComputeApi for SlowAttachments {
        async fn get_instance(&self, _instance_id: &str) -> Result<InstanceDetails> {
            Ok(InstanceDetails::default())
        }

        async fn list_vnic_attachments(
            &self,
            _compartment_id: &str,
            _instance_id: &str,
        ) -> Result<Vec<NetworkAttachment>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    struct NoVnics;

    #[async_trait]
    impl NetworkApi for NoVnics {
        async fn get_vnic(&self, vnic_id: &str) -> Result<NetworkInterface> {
            Err(CoreError::transport(
                TransportKind::Api,
                format!("unexpected VNIC lookup {vnic_id}"),
            ))
        }
    }

    fn dims(pairs: &[(&str, &str)]) -> StringMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_mql_sorted_dimensions() {
        let query = build_mql(
            "MemoryUtilization",
            &dims(&[("resourceId", "ocid1.instance.oc1..a"), ("faultDomain", "FD-1")]),
        );
        assert_eq!(
            query,
            r#"MemoryUtilization{faultDomain="FD-1", resourceId="ocid1.instance.oc1..a"}[1m].mean()"#
        );
    }

    #[test]
    fn test_mql_escapes_dimension_values() {
        let query = build_mql(
            "CpuUtilization",
            &dims(&[("resourceId", r#"a"} || x{b="c\"#)]),
        );
        assert_eq!(
            query,
            r#"CpuUtilization{resourceId="a\"} || x{b=\"c\\"}[1m].mean()"#
        );
    }

    #[tokio::test]
    async fn test_metric_name_must_be_identifier() {
        let adapter = ProviderAdapter::builder().build();
        let request = MetricRequest {
            compartment_id: "ocid1.compartment.oc1..c".to_string(),
            namespace: "oci_computeagent".to_string(),
            metric_name: "CpuUtilization{x=\"1\"}".to_string(),
            dimensions: StringMap::new(),
            start_time: Utc::now(),
            end_time: Utc::now(),
        };

        let err = adapter.query_metric_series(&request).await.unwrap_err();
        assert!(matches!(err, CoreError::MalformedInput(_)));
        assert!(err.to_string().contains("Invalid metric name"));
    }

    #[test]
    fn test_default_scope_prefers_override() {
        let adapter = ProviderAdapter::builder()
            .config(OciConfig {
                profile: "DEFAULT".to_string(),
                user: "ocid1.user.oc1..u".to_string(),
                fingerprint: String::new(),
                key_file: Default::default(),
                tenancy: "ocid1.tenancy.oc1..t".to_string(),
                region: "eu-frankfurt-1".to_string(),
            })
            .compartment_override(Some("ocid1.compartment.oc1..c".to_string()))
            .build();
        assert_eq!(
            adapter.get_default_scope().as_deref(),
            Some("ocid1.compartment.oc1..c")
        );
    }

    #[test]
    fn test_default_scope_none_without_config() {
        let adapter = ProviderAdapter::builder()
            .compartment_override(Some("  ".to_string()))
            .build();
        assert!(adapter.get_default_scope().is_none());
        assert!(!adapter.has_compute());
        assert!(adapter.region().is_none());
    }

    #[tokio::test]
    async fn test_details_without_compute_is_unsupported() {
        let adapter = ProviderAdapter::builder().build();
        let err = adapter
            .get_instance_details("ocid1.instance.oc1..a")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnsupportedFallback(Operation::GetInstanceDetails)
        ));
    }

    #[tokio::test]
    async fn test_best_effort_operations_without_clients() {
        let adapter = ProviderAdapter::builder().build();
        assert!(
            adapter
                .list_network_attachments("ocid1.instance.oc1..a", "ocid1.compartment.oc1..c")
                .await
                .is_empty()
        );
        assert!(
            adapter
                .get_network_interface("ocid1.vnic.oc1..v")
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_enrichment_fan_out_is_bounded() {
        let compute = Arc::new(SlowAttachments {
            instances: 60,
            ..Default::default()
        });
        let adapter = ProviderAdapter::builder()
            .compute(compute.clone())
            .network(Arc::new(NoVnics))
            .build();

        let instances = adapter
            .list_instances_with_network("ocid1.compartment.oc1..c", LifecycleState::Running)
            .await
            .unwrap();

        assert_eq!(instances.len(), 60);
        let ids: Vec<String> = (0..60).map(|i| format!("ocid1.instance.oc1..{i}")).collect();
        assert_eq!(
            instances.iter().map(|i| i.id.clone()).collect::<Vec<_>>(),
            ids
        );

        let peak = compute.peak.load(Ordering::SeqCst);
        assert!(peak <= ENRICHMENT_CONCURRENCY, "peak in-flight was {peak}");
        assert!(peak > 1, "enrichment should still overlap");
    }

    #[tokio::test]
    async fn test_sdk_listing_without_compute_is_configuration_error() {
        let adapter = ProviderAdapter::builder().build();
        let err = adapter
            .list_instances_sdk("ocid1.compartment.oc1..c", LifecycleState::Running)
            .await
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
