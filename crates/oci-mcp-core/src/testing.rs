//! Test support: a mock OCI endpoint and canned transports
//!
//! Enabled with the `test-support` feature.
//!
//! ```rust,ignore
//! let server = MockOciServer::start().await;
//! server
//!     .mock_instances_list(vec![InstanceFixture::new("ocid1.instance.oc1..a", "web-1").build()])
//!     .await;
//! let adapter = server.adapter_builder().build();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::adapter::ProviderAdapterBuilder;
use crate::config::OciConfig;
use crate::error::{CoreError, Result};
use crate::model::{Instance, LifecycleState};
use crate::transport::rest::signer::http_date;
use crate::transport::rest::{
    ApiError, ComputeClient, Endpoints, MonitoringClient, RequestSigner, RestClient,
    SignableRequest, SignedHeaders, VirtualNetworkClient,
};
use crate::transport::{InstanceSource, TransportKind};

pub const TEST_REGION: &str = "eu-frankfurt-1";
pub const TEST_TENANCY: &str = "ocid1.tenancy.oc1..aaaaaaaatesttenancy";

/// Config matching what the mock server answers for
pub fn test_config() -> OciConfig {
    OciConfig {
        profile: "DEFAULT".to_string(),
        user: "ocid1.user.oc1..aaaaaaaatestuser".to_string(),
        fingerprint: "aa:bb:cc:dd:ee:ff:00:11:22:33:44:55:66:77:88:99".to_string(),
        key_file: "/dev/null".into(),
        tenancy: TEST_TENANCY.to_string(),
        region: TEST_REGION.to_string(),
    }
}

/// Signer that attaches a fixed authorization header
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticSigner;

impl RequestSigner for StaticSigner {
    fn sign(&self, request: &SignableRequest<'_>) -> std::result::Result<SignedHeaders, ApiError> {
        Ok(vec![
            ("date", http_date(request.date)),
            ("authorization", "Signature version=\"1\",keyId=\"test\"".to_string()),
        ])
    }
}

/// Wiremock server answering the compute, network and monitoring endpoints
pub struct MockOciServer {
    server: MockServer,
}

impl MockOciServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(
            &format!("{}/20160918/", self.uri()),
            &format!("{}/20180401/", self.uri()),
        )
        .expect("mock server URI is a valid base")
    }

    pub fn rest_client(&self) -> RestClient {
        RestClient::new(Arc::new(StaticSigner), Duration::from_secs(5))
            .expect("reqwest client builds")
    }

    /// Adapter builder with all three REST clients pointed at this server
    pub fn adapter_builder(&self) -> ProviderAdapterBuilder {
        let rest = self.rest_client();
        let endpoints = self.endpoints();
        crate::adapter::ProviderAdapter::builder()
            .config(test_config())
            .compute(Arc::new(ComputeClient::new(
                rest.clone(),
                endpoints.iaas.clone(),
                TEST_REGION,
            )))
            .network(Arc::new(VirtualNetworkClient::new(
                rest.clone(),
                endpoints.iaas,
            )))
            .monitoring(Arc::new(MonitoringClient::new(rest, endpoints.telemetry)))
    }

    pub async fn mock_instances_list(&self, instances: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path("/20160918/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(instances)))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_instances_list_error(&self, status: u16, code: &str, message: &str) {
        Mock::given(method("GET"))
            .and(path("/20160918/instances"))
            .respond_with(error_response(status, code, message))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_instance_get(&self, instance_id: &str, instance: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/20160918/instances/{}", instance_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(instance))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_instance_get_error(&self, instance_id: &str, status: u16, code: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/20160918/instances/{}", instance_id)))
            .respond_with(error_response(status, code, "request failed"))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_vnic_attachments(&self, instance_id: &str, attachments: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path("/20160918/vnicAttachments"))
            .and(query_param("instanceId", instance_id))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(attachments)))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_vnic_attachments_error(&self, instance_id: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path("/20160918/vnicAttachments"))
            .and(query_param("instanceId", instance_id))
            .respond_with(error_response(status, "InternalError", "attachment lookup failed"))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_vnic_get(&self, vnic_id: &str, vnic: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/20160918/vnics/{}", vnic_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(vnic))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_summarize_metrics(&self, metrics: Vec<Value>) {
        Mock::given(method("POST"))
            .and(path("/20180401/metrics/actions/summarizeMetricsData"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(metrics)))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_summarize_metrics_error(&self, status: u16, code: &str) {
        Mock::given(method("POST"))
            .and(path("/20180401/metrics/actions/summarizeMetricsData"))
            .respond_with(error_response(status, code, "metrics query failed"))
            .mount(&self.server)
            .await;
    }
}

fn error_response(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({"code": code, "message": message}))
}

/// Compute API instance payload
pub struct InstanceFixture {
    value: Value,
}

impl InstanceFixture {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            value: json!({
                "id": id,
                "displayName": display_name,
                "shape": "VM.Standard.E4.Flex",
                "lifecycleState": "RUNNING",
                "availabilityDomain": "Uocm:EU-FRANKFURT-1-AD-1",
                "faultDomain": "FAULT-DOMAIN-1",
                "compartmentId": TEST_TENANCY,
                "region": "eu-frankfurt-1",
                "timeCreated": "2025-01-10T08:00:00.000Z",
                "imageId": "ocid1.image.oc1..aaaaaaaatestimage",
                "metadata": {},
                "freeformTags": {},
                "definedTags": {}
            }),
        }
    }

    pub fn shape(mut self, shape: &str) -> Self {
        self.value["shape"] = json!(shape);
        self
    }

    pub fn lifecycle_state(mut self, state: &str) -> Self {
        self.value["lifecycleState"] = json!(state);
        self
    }

    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.value[key] = value;
        self
    }

    pub fn build(self) -> Value {
        self.value
    }
}

/// VNIC attachment payload
pub struct VnicAttachmentFixture {
    value: Value,
}

impl VnicAttachmentFixture {
    pub fn new(id: &str, instance_id: &str, vnic_id: &str) -> Self {
        Self {
            value: json!({
                "id": id,
                "displayName": null,
                "instanceId": instance_id,
                "vnicId": vnic_id,
                "lifecycleState": "ATTACHED",
                "nicIndex": 0,
                "subnetId": "ocid1.subnet.oc1..aaaaaaaatestsubnet",
                "vlanId": null
            }),
        }
    }

    pub fn nic_index(mut self, index: i64) -> Self {
        self.value["nicIndex"] = json!(index);
        self
    }

    pub fn build(self) -> Value {
        self.value
    }
}

/// VNIC payload
pub struct VnicFixture {
    value: Value,
}

impl VnicFixture {
    pub fn new(id: &str, private_ip: &str) -> Self {
        Self {
            value: json!({
                "id": id,
                "displayName": null,
                "privateIp": private_ip,
                "publicIp": null,
                "hostnameLabel": null,
                "isPrimary": false,
                "macAddress": "02:00:17:00:00:01",
                "subnetId": "ocid1.subnet.oc1..aaaaaaaatestsubnet",
                "lifecycleState": "AVAILABLE",
                "skipSourceDestCheck": false,
                "timeCreated": "2025-01-10T08:00:00.000Z",
                "nsgIds": []
            }),
        }
    }

    pub fn primary(mut self) -> Self {
        self.value["isPrimary"] = json!(true);
        self
    }

    pub fn public_ip(mut self, ip: &str) -> Self {
        self.value["publicIp"] = json!(ip);
        self
    }

    pub fn hostname(mut self, hostname: &str) -> Self {
        self.value["hostnameLabel"] = json!(hostname);
        self
    }

    pub fn build(self) -> Value {
        self.value
    }
}

/// One metric stream in a summarizeMetricsData response
pub struct MetricFixture {
    value: Value,
}

impl MetricFixture {
    pub fn new(name: &str, resource_id: &str) -> Self {
        Self {
            value: json!({
                "namespace": "oci_computeagent",
                "compartmentId": TEST_TENANCY,
                "name": name,
                "dimensions": {"resourceId": resource_id},
                "resolution": "PT1M",
                "aggregatedDatapoints": []
            }),
        }
    }

    pub fn point(mut self, timestamp: &str, value: f64) -> Self {
        if let Some(points) = self.value["aggregatedDatapoints"].as_array_mut() {
            points.push(json!({"timestamp": timestamp, "value": value}));
        }
        self
    }

    pub fn build(self) -> Value {
        self.value
    }
}

/// Instance source returning a canned result and counting calls
pub struct StaticInstanceSource {
    kind: TransportKind,
    result: std::result::Result<Vec<Instance>, String>,
    calls: AtomicUsize,
}

impl StaticInstanceSource {
    /// A CLI that answers with `instances`
    pub fn cli(instances: Vec<Instance>) -> Self {
        Self {
            kind: TransportKind::Cli,
            result: Ok(instances),
            calls: AtomicUsize::new(0),
        }
    }

    /// A CLI whose every call fails with `message`
    pub fn failing_cli(message: &str) -> Self {
        Self {
            kind: TransportKind::Cli,
            result: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InstanceSource for StaticInstanceSource {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn list_instances(
        &self,
        _compartment_id: &str,
        lifecycle_state: LifecycleState,
    ) -> Result<Vec<Instance>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.result {
            Ok(instances) => Ok(instances
                .iter()
                .cloned()
                .map(|mut instance| {
                    instance.lifecycle_state = lifecycle_state;
                    instance
                })
                .collect()),
            Err(message) => Err(CoreError::transport(
                self.kind,
                format!("CLI command failed: {}", message),
            )),
        }
    }
}

/// Instance as the CLI fallback reports it
pub fn cli_instance(id: &str, display_name: &str) -> Instance {
    Instance {
        id: id.to_string(),
        display_name: display_name.to_string(),
        shape: "VM.Standard.A1.Flex".to_string(),
        availability_domain: "Uocm:EU-FRANKFURT-1-AD-2".to_string(),
        compartment_id: TEST_TENANCY.to_string(),
        region: "unknown".to_string(),
        time_created: Some(Utc::now()),
        ..Default::default()
    }
}
