//! Compute service client (`/20160918/instances`, `/20160918/vnicAttachments`)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;
use url::Url;

use super::{RestClient, endpoint};
use crate::error::Result;
use crate::model::{
    DefinedTags, Instance, InstanceDetails, LifecycleState, NetworkAttachment, StringMap,
};
use crate::transport::{ComputeApi, InstanceSource, TransportKind};

/// Instance as returned by the Compute API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireInstance {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    shape: Option<String>,
    lifecycle_state: String,
    #[serde(default)]
    availability_domain: Option<String>,
    #[serde(default)]
    fault_domain: Option<String>,
    compartment_id: String,
    #[serde(default)]
    time_created: Option<DateTime<Utc>>,
    #[serde(default)]
    image_id: Option<String>,
    #[serde(default)]
    metadata: Option<StringMap>,
    #[serde(default)]
    extended_metadata: Option<Map<String, Value>>,
    #[serde(default)]
    freeform_tags: Option<StringMap>,
    #[serde(default)]
    defined_tags: Option<DefinedTags>,
    #[serde(default)]
    launch_options: Option<Map<String, Value>>,
    #[serde(default)]
    instance_options: Option<Map<String, Value>>,
    #[serde(default)]
    availability_config: Option<Map<String, Value>>,
    #[serde(default)]
    preemptible_instance_config: Option<Map<String, Value>>,
    #[serde(default)]
    agent_config: Option<Map<String, Value>>,
}

impl WireInstance {
    fn into_details(self, region: &str) -> InstanceDetails {
        let instance = Instance {
            id: self.id,
            display_name: self.display_name.unwrap_or_default(),
            shape: self.shape.unwrap_or_default(),
            lifecycle_state: LifecycleState::from_provider(&self.lifecycle_state),
            availability_domain: self.availability_domain.unwrap_or_default(),
            fault_domain: self.fault_domain,
            compartment_id: self.compartment_id,
            region: region.to_string(),
            time_created: self.time_created,
            image_id: self.image_id,
            metadata: self.metadata.unwrap_or_default(),
            freeform_tags: self.freeform_tags.unwrap_or_default(),
            defined_tags: self.defined_tags.unwrap_or_default(),
            ..Default::default()
        };

        InstanceDetails {
            instance,
            extended_metadata: self.extended_metadata.unwrap_or_default(),
            launch_options: self.launch_options.unwrap_or_default(),
            instance_options: self.instance_options.unwrap_or_default(),
            availability_config: self.availability_config.unwrap_or_default(),
            preemptible_instance_config: self.preemptible_instance_config.unwrap_or_default(),
            agent_config: self.agent_config.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireVnicAttachment {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
    instance_id: String,
    #[serde(default)]
    vnic_id: Option<String>,
    lifecycle_state: String,
    #[serde(default)]
    nic_index: Option<i64>,
    #[serde(default)]
    subnet_id: Option<String>,
    #[serde(default)]
    vlan_id: Option<String>,
}

impl From<WireVnicAttachment> for NetworkAttachment {
    fn from(wire: WireVnicAttachment) -> Self {
        NetworkAttachment {
            id: wire.id,
            display_name: wire.display_name,
            instance_id: wire.instance_id,
            vnic_id: wire.vnic_id,
            lifecycle_state: wire.lifecycle_state,
            nic_index: wire.nic_index,
            subnet_id: wire.subnet_id,
            vlan_id: wire.vlan_id,
        }
    }
}

/// Compute API client bound to one region
#[derive(Clone)]
pub struct ComputeClient {
    rest: RestClient,
    base: Url,
    region: String,
}

impl ComputeClient {
    /// `base` is the iaas endpoint, e.g. `https://iaas.<region>.oraclecloud.com/20160918/`
    pub fn new(rest: RestClient, base: Url, region: impl Into<String>) -> Self {
        Self {
            rest,
            base,
            region: region.into(),
        }
    }
}

#[async_trait]
impl InstanceSource for ComputeClient {
    fn kind(&self) -> TransportKind {
        TransportKind::Api
    }

    async fn list_instances(
        &self,
        compartment_id: &str,
        lifecycle_state: LifecycleState,
    ) -> Result<Vec<Instance>> {
        info!(
            compartment_id = %compartment_id,
            lifecycle_state = %lifecycle_state,
            "Listing instances via OCI API"
        );

        let mut url = endpoint(&self.base, &["instances"])?;
        url.query_pairs_mut()
            .append_pair("compartmentId", compartment_id)
            .append_pair("lifecycleState", lifecycle_state.as_str());

        let wire: Vec<WireInstance> = self.rest.get(url).await?;
        let instances: Vec<Instance> = wire
            .into_iter()
            .map(|w| w.into_details(&self.region).instance)
            .collect();

        info!(count = instances.len(), "Found instances via OCI API");
        Ok(instances)
    }
}

#[async_trait]
impl ComputeApi for ComputeClient {
    async fn get_instance(&self, instance_id: &str) -> Result<InstanceDetails> {
        info!(instance_id = %instance_id, "Getting instance details via OCI API");

        let url = endpoint(&self.base, &["instances", instance_id])?;
        let wire: WireInstance = self.rest.get(url).await?;
        Ok(wire.into_details(&self.region))
    }

    async fn list_vnic_attachments(
        &self,
        compartment_id: &str,
        instance_id: &str,
    ) -> Result<Vec<NetworkAttachment>> {
        let mut url = endpoint(&self.base, &["vnicAttachments"])?;
        url.query_pairs_mut()
            .append_pair("compartmentId", compartment_id)
            .append_pair("instanceId", instance_id);

        let wire: Vec<WireVnicAttachment> = self.rest.get(url).await?;
        Ok(wire.into_iter().map(NetworkAttachment::from).collect())
    }
}
