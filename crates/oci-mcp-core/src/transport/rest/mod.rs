//! Signed REST transport for the OCI control-plane API
//!
//! [`RestClient`] owns the HTTP client and the request signer and is shared by
//! the per-service clients ([`ComputeClient`], [`VirtualNetworkClient`],
//! [`MonitoringClient`]). Only the first page of list calls is read.

pub mod compute;
pub mod monitoring;
pub mod network;
pub mod signer;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, trace};
use url::Url;

pub use compute::ComputeClient;
pub use monitoring::MonitoringClient;
pub use network::VirtualNetworkClient;
pub use signer::{ApiKeySigner, RequestSigner, SignableRequest, SignedHeaders};

/// Compute and virtual network API version
pub const IAAS_API_VERSION: &str = "20160918";
/// Monitoring API version
pub const TELEMETRY_API_VERSION: &str = "20180401";

/// Errors from the REST transport
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status} ({}): {message}", .code.as_deref().unwrap_or("unknown"))]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Request signing failed: {0}")]
    Signing(String),

    #[error("Failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Returns true for 401/403 responses
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Status { status: 401 | 403, .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }

    fn from_response(status: u16, body: &[u8]) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            code: Option<String>,
            message: Option<String>,
        }

        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(parsed) => ApiError::Status {
                status,
                code: parsed.code,
                message: parsed.message.unwrap_or_default(),
            },
            Err(_) => ApiError::Status {
                status,
                code: None,
                message: String::from_utf8_lossy(body).trim().to_string(),
            },
        }
    }
}

/// Base URLs of the services the adapter talks to
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub iaas: Url,
    pub telemetry: Url,
}

impl Endpoints {
    /// Public endpoints for `region`, e.g. `https://iaas.eu-frankfurt-1.oraclecloud.com/20160918/`
    pub fn for_region(region: &str) -> Result<Self, ApiError> {
        Self::new(
            &format!("https://iaas.{}.oraclecloud.com/{}/", region, IAAS_API_VERSION),
            &format!(
                "https://telemetry.{}.oraclecloud.com/{}/",
                region, TELEMETRY_API_VERSION
            ),
        )
    }

    /// Explicit base URLs (both must end in the API version path)
    pub fn new(iaas: &str, telemetry: &str) -> Result<Self, ApiError> {
        Ok(Self {
            iaas: parse_base(iaas)?,
            telemetry: parse_base(telemetry)?,
        })
    }
}

fn parse_base(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl(format!("{} cannot be a base URL", raw)));
    }
    Ok(url)
}

/// Append path segments to a base URL, percent-encoding each one
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidUrl(format!("{} cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Shared, signed HTTP client
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    signer: Arc<dyn RequestSigner>,
}

impl RestClient {
    pub fn new(signer: Arc<dyn RequestSigner>, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("oci-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, signer })
    }

    /// Signed GET, decoding the JSON response
    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let bytes = self.send(Method::GET, url, None).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Signed POST with a JSON body, decoding the JSON response
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_vec(body)?;
        let bytes = self.send(Method::POST, url, Some(body)).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, ApiError> {
        let headers = self.signer.sign(&SignableRequest {
            method: &method,
            url: &url,
            body: body.as_deref(),
            date: Utc::now(),
        })?;

        debug!(method = %method, url = %url, "OCI API request");

        let mut request = self.http.request(method, url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        trace!(status = status.as_u16(), len = bytes.len(), "OCI API response");

        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &bytes));
        }
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_endpoints() {
        let endpoints = Endpoints::for_region("eu-frankfurt-1").unwrap();
        assert_eq!(
            endpoints.iaas.as_str(),
            "https://iaas.eu-frankfurt-1.oraclecloud.com/20160918/"
        );
        assert_eq!(
            endpoints.telemetry.as_str(),
            "https://telemetry.eu-frankfurt-1.oraclecloud.com/20180401/"
        );
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let endpoints = Endpoints::for_region("us-ashburn-1").unwrap();
        let url = endpoint(&endpoints.iaas, &["instances", "ocid1.instance.oc1..abc"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://iaas.us-ashburn-1.oraclecloud.com/20160918/instances/ocid1.instance.oc1..abc"
        );
    }

    #[test]
    fn test_error_body_parsed() {
        let err = ApiError::from_response(
            404,
            br#"{"code":"NotAuthorizedOrNotFound","message":"Authorization failed or requested resource not found."}"#,
        );
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "API returned 404 (NotAuthorizedOrNotFound): Authorization failed or requested resource not found."
        );
    }

    #[test]
    fn test_non_json_error_body() {
        let err = ApiError::from_response(502, b"Bad Gateway\n");
        assert!(!err.is_auth());
        assert_eq!(err.to_string(), "API returned 502 (unknown): Bad Gateway");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(Endpoints::new("not a url", "https://telemetry.example.com/").is_err());
    }
}
