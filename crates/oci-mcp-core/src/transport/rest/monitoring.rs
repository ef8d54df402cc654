//! Monitoring service client (`/20180401/metrics/actions/summarizeMetricsData`)

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::{RestClient, endpoint};
use crate::error::Result;
use crate::transport::{MetricData, MetricQuery, MonitoringApi};

/// Monitoring (telemetry) API client
#[derive(Clone)]
pub struct MonitoringClient {
    rest: RestClient,
    base: Url,
}

impl MonitoringClient {
    /// `base` is the telemetry endpoint, e.g. `https://telemetry.<region>.oraclecloud.com/20180401/`
    pub fn new(rest: RestClient, base: Url) -> Self {
        Self { rest, base }
    }
}

#[async_trait]
impl MonitoringApi for MonitoringClient {
    async fn summarize_metrics(&self, query: &MetricQuery) -> Result<Vec<MetricData>> {
        let mut url = endpoint(&self.base, &["metrics", "actions", "summarizeMetricsData"])?;
        url.query_pairs_mut()
            .append_pair("compartmentId", &query.compartment_id);

        debug!(query = %query.query, namespace = %query.namespace, "Summarizing metrics");
        Ok(self.rest.post(url, query).await?)
    }
}
