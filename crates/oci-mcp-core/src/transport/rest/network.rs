//! Virtual network service client (`/20160918/vnics/{id}`)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

use super::{RestClient, endpoint};
use crate::error::Result;
use crate::model::NetworkInterface;
use crate::transport::NetworkApi;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireVnic {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    private_ip: Option<String>,
    #[serde(default)]
    public_ip: Option<String>,
    #[serde(default)]
    hostname_label: Option<String>,
    #[serde(default)]
    is_primary: Option<bool>,
    #[serde(default)]
    mac_address: Option<String>,
    #[serde(default)]
    subnet_id: Option<String>,
    lifecycle_state: String,
    #[serde(default)]
    skip_source_dest_check: Option<bool>,
    #[serde(default)]
    time_created: Option<DateTime<Utc>>,
    #[serde(default)]
    nsg_ids: Option<Vec<String>>,
}

impl From<WireVnic> for NetworkInterface {
    fn from(wire: WireVnic) -> Self {
        NetworkInterface {
            id: wire.id,
            display_name: wire.display_name,
            private_ip: wire.private_ip,
            public_ip: wire.public_ip,
            hostname: wire.hostname_label,
            is_primary: wire.is_primary.unwrap_or(false),
            mac_address: wire.mac_address,
            subnet_id: wire.subnet_id,
            lifecycle_state: wire.lifecycle_state,
            skip_source_dest_check: wire.skip_source_dest_check,
            time_created: wire.time_created,
            nsg_ids: wire.nsg_ids.unwrap_or_default(),
        }
    }
}

/// Virtual network API client
#[derive(Clone)]
pub struct VirtualNetworkClient {
    rest: RestClient,
    base: Url,
}

impl VirtualNetworkClient {
    pub fn new(rest: RestClient, base: Url) -> Self {
        Self { rest, base }
    }
}

#[async_trait]
impl NetworkApi for VirtualNetworkClient {
    async fn get_vnic(&self, vnic_id: &str) -> Result<NetworkInterface> {
        let url = endpoint(&self.base, &["vnics", vnic_id])?;
        let wire: WireVnic = self.rest.get(url).await?;
        Ok(wire.into())
    }
}
