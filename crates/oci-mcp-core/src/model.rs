//! Transport-agnostic records assembled by the adapter
//!
//! These are the shapes tool handlers serialize. Every field is always
//! present in the JSON output: absent values become `null`, `{}` or `[]`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Free-form string map (metadata, freeform tags)
pub type StringMap = BTreeMap<String, String>;

/// Defined tags: namespace -> key -> value
pub type DefinedTags = BTreeMap<String, BTreeMap<String, Value>>;

/// Compute instance lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Moving,
    Provisioning,
    #[default]
    Running,
    Starting,
    Stopping,
    Stopped,
    CreatingImage,
    Terminating,
    Terminated,
    /// Reported by the provider but not a known state
    #[serde(other)]
    Unknown,
}

impl LifecycleState {
    /// Wire representation used by the API and the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Moving => "MOVING",
            LifecycleState::Provisioning => "PROVISIONING",
            LifecycleState::Running => "RUNNING",
            LifecycleState::Starting => "STARTING",
            LifecycleState::Stopping => "STOPPING",
            LifecycleState::Stopped => "STOPPED",
            LifecycleState::CreatingImage => "CREATING_IMAGE",
            LifecycleState::Terminating => "TERMINATING",
            LifecycleState::Terminated => "TERMINATED",
            LifecycleState::Unknown => "UNKNOWN",
        }
    }

    /// Lenient mapping for provider output: unrecognized values become `Unknown`
    pub fn from_provider(value: &str) -> Self {
        value.parse().unwrap_or(LifecycleState::Unknown)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let state = match s.trim().to_ascii_uppercase().as_str() {
            "MOVING" => LifecycleState::Moving,
            "PROVISIONING" => LifecycleState::Provisioning,
            "RUNNING" => LifecycleState::Running,
            "STARTING" => LifecycleState::Starting,
            "STOPPING" => LifecycleState::Stopping,
            "STOPPED" => LifecycleState::Stopped,
            "CREATING_IMAGE" => LifecycleState::CreatingImage,
            "TERMINATING" => LifecycleState::Terminating,
            "TERMINATED" => LifecycleState::Terminated,
            _ => {
                return Err(CoreError::MalformedInput(format!(
                    "Unknown lifecycle state '{}'",
                    s
                )));
            }
        };
        Ok(state)
    }
}

/// A compute instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    pub display_name: String,
    pub shape: String,
    pub lifecycle_state: LifecycleState,
    pub availability_domain: String,
    pub fault_domain: Option<String>,
    pub compartment_id: String,
    pub region: String,
    pub time_created: Option<DateTime<Utc>>,
    pub image_id: Option<String>,
    #[serde(default)]
    pub metadata: StringMap,
    #[serde(default)]
    pub freeform_tags: StringMap,
    #[serde(default)]
    pub defined_tags: DefinedTags,
    /// Attached interfaces; empty unless network enrichment ran
    #[serde(default)]
    pub network_info: Vec<NetworkInfo>,
    pub primary_private_ip: Option<String>,
    pub primary_public_ip: Option<String>,
    pub hostname: Option<String>,
}

impl Instance {
    /// Populate the network fields from enrichment results.
    ///
    /// The first interface flagged primary feeds the convenience fields; with
    /// no primary they are all cleared.
    pub fn attach_network(&mut self, network_info: Vec<NetworkInfo>) {
        match network_info.iter().find(|ni| ni.is_primary) {
            Some(primary) => {
                self.primary_private_ip = primary.private_ip.clone();
                self.primary_public_ip = primary.public_ip.clone();
                self.hostname = primary.hostname.clone();
            }
            None => self.clear_primary(),
        }
        self.network_info = network_info;
    }

    /// Drop all network data, leaving the fields present but empty
    pub fn clear_network(&mut self) {
        self.network_info.clear();
        self.clear_primary();
    }

    fn clear_primary(&mut self) {
        self.primary_private_ip = None;
        self.primary_public_ip = None;
        self.hostname = None;
    }
}

/// Full instance configuration returned by `get_instance_details`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceDetails {
    #[serde(flatten)]
    pub instance: Instance,
    #[serde(default)]
    pub extended_metadata: Map<String, Value>,
    #[serde(default)]
    pub launch_options: Map<String, Value>,
    #[serde(default)]
    pub instance_options: Map<String, Value>,
    #[serde(default)]
    pub availability_config: Map<String, Value>,
    #[serde(default)]
    pub preemptible_instance_config: Map<String, Value>,
    #[serde(default)]
    pub agent_config: Map<String, Value>,
}

/// Link between an instance and a VNIC
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAttachment {
    pub id: String,
    pub display_name: Option<String>,
    pub instance_id: String,
    /// Unset while the attachment is still being created
    pub vnic_id: Option<String>,
    pub lifecycle_state: String,
    pub nic_index: Option<i64>,
    pub subnet_id: Option<String>,
    pub vlan_id: Option<String>,
}

/// A virtual network interface card
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    pub id: String,
    pub display_name: Option<String>,
    pub private_ip: Option<String>,
    pub public_ip: Option<String>,
    pub hostname: Option<String>,
    pub is_primary: bool,
    pub mac_address: Option<String>,
    pub subnet_id: Option<String>,
    pub lifecycle_state: String,
    pub skip_source_dest_check: Option<bool>,
    pub time_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub nsg_ids: Vec<String>,
}

/// Per-interface summary embedded on an [`Instance`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub is_primary: bool,
    pub private_ip: Option<String>,
    pub public_ip: Option<String>,
    pub hostname: Option<String>,
    pub mac_address: Option<String>,
    pub nic_index: Option<i64>,
}

impl NetworkInfo {
    pub fn new(vnic: &NetworkInterface, attachment: &NetworkAttachment) -> Self {
        Self {
            is_primary: vnic.is_primary,
            private_ip: vnic.private_ip.clone(),
            public_ip: vnic.public_ip.clone(),
            hostname: vnic.hostname.clone(),
            mac_address: vnic.mac_address.clone(),
            nic_index: attachment.nic_index,
        }
    }
}

/// A single aggregated datapoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub dimensions: StringMap,
}

/// Flattened metric query result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSeries {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: StringMap,
    pub aggregated_datapoints: Vec<MetricPoint>,
    pub retrieved_at: DateTime<Utc>,
}
