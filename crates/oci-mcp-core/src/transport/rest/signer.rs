//! OCI HTTP request signing (signature version 1)
//!
//! Every API call carries an `authorization` header built from a signing
//! string over a fixed set of headers. Requests without a body sign
//! `date (request-target) host`; requests with a body additionally sign
//! `content-length content-type x-content-sha256`.

use std::fmt;
use std::fs;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use reqwest::Method;
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use sha2::{Digest, Sha256};
use url::Url;

use super::ApiError;
use crate::config::{ConfigError, OciConfig};

/// Content type for every request body the client sends
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Headers a signer asks the transport to attach
pub type SignedHeaders = Vec<(&'static str, String)>;

/// The parts of an outgoing request that go into the signature
#[derive(Debug, Clone, Copy)]
pub struct SignableRequest<'a> {
    pub method: &'a Method,
    pub url: &'a Url,
    pub body: Option<&'a [u8]>,
    pub date: DateTime<Utc>,
}

/// Produces authentication headers for a request
pub trait RequestSigner: Send + Sync {
    fn sign(&self, request: &SignableRequest<'_>) -> Result<SignedHeaders, ApiError>;
}

/// Signs with an API signing key from the OCI config file
#[derive(Clone)]
pub struct ApiKeySigner {
    key_id: String,
    key: SigningKey<Sha256>,
}

impl fmt::Debug for ApiKeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeySigner")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl ApiKeySigner {
    /// Build a signer from a PEM private key (PKCS#1 or PKCS#8)
    pub fn from_pem(key_id: impl Into<String>, pem: &str) -> Result<Self, ConfigError> {
        let key = RsaPrivateKey::from_pkcs1_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
            .map_err(|e| ConfigError::KeyError {
                path: "<pem>".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            key_id: key_id.into(),
            key: SigningKey::<Sha256>::new(key),
        })
    }

    /// Read the key referenced by `key_file` in `config`
    pub fn from_config(config: &OciConfig) -> Result<Self, ConfigError> {
        let path = config.key_file.display().to_string();
        let pem = fs::read_to_string(&config.key_file).map_err(|e| ConfigError::KeyError {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        Self::from_pem(config.key_id(), &pem).map_err(|e| match e {
            ConfigError::KeyError { reason, .. } => ConfigError::KeyError { path, reason },
            other => other,
        })
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}

impl RequestSigner for ApiKeySigner {
    fn sign(&self, request: &SignableRequest<'_>) -> Result<SignedHeaders, ApiError> {
        let date = http_date(request.date);
        let mut signed: Vec<(&'static str, String)> = vec![
            ("date", date.clone()),
            ("(request-target)", request_target(request.method, request.url)),
            ("host", host_header(request.url)?),
        ];
        let mut attach: SignedHeaders = vec![("date", date)];

        if let Some(body) = request.body {
            let digest = STANDARD.encode(Sha256::digest(body));
            signed.push(("content-length", body.len().to_string()));
            signed.push(("content-type", JSON_CONTENT_TYPE.to_string()));
            signed.push(("x-content-sha256", digest.clone()));
            // content-length is set by the HTTP client itself
            attach.push(("content-type", JSON_CONTENT_TYPE.to_string()));
            attach.push(("x-content-sha256", digest));
        }

        let signing_string = signing_string(&signed);
        let signature = self
            .key
            .try_sign(signing_string.as_bytes())
            .map_err(|e| ApiError::Signing(e.to_string()))?;

        let header_names: Vec<&str> = signed.iter().map(|(name, _)| *name).collect();
        attach.push((
            "authorization",
            format!(
                "Signature version=\"1\",keyId=\"{}\",algorithm=\"rsa-sha256\",headers=\"{}\",signature=\"{}\"",
                self.key_id,
                header_names.join(" "),
                STANDARD.encode(signature.to_bytes())
            ),
        ));

        Ok(attach)
    }
}

/// RFC 7231 date, as sent in the `date` header
pub fn http_date(date: DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// `<method> <path>[?<query>]`, method lowercased
pub fn request_target(method: &Method, url: &Url) -> String {
    let mut target = format!("{} {}", method.as_str().to_lowercase(), url.path());
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }
    target
}

/// Host header value the HTTP client will send for `url`
pub fn host_header(url: &Url) -> Result<String, ApiError> {
    let host = url
        .host_str()
        .ok_or_else(|| ApiError::InvalidUrl(format!("{} has no host", url)))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Lines of `name: value` joined by newlines
pub fn signing_string(headers: &[(&'static str, String)]) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rsa::pkcs1v15::{Signature, VerifyingKey};
    use rsa::signature::{Keypair, Verifier};

    const PKCS1_KEY: &str = include_str!("../../../tests/fixtures/test_api_key.pem");
    const PKCS8_KEY: &str = include_str!("../../../tests/fixtures/test_api_key_pkcs8.pem");

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 7, 21, 31, 40).unwrap()
    }

    fn header<'a>(headers: &'a SignedHeaders, name: &str) -> &'a str {
        headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| panic!("missing header {name}"))
    }

    fn signature_of(authorization: &str) -> Vec<u8> {
        let encoded = authorization
            .split("signature=\"")
            .nth(1)
            .and_then(|rest| rest.strip_suffix('"'))
            .unwrap();
        STANDARD.decode(encoded).unwrap()
    }

    #[test]
    fn test_http_date_format() {
        assert_eq!(http_date(date()), "Tue, 07 Jan 2025 21:31:40 GMT");
    }

    #[test]
    fn test_request_target_includes_query() {
        let url = Url::parse(
            "https://iaas.eu-frankfurt-1.oraclecloud.com/20160918/instances?compartmentId=ocid1.c&lifecycleState=RUNNING",
        )
        .unwrap();
        assert_eq!(
            request_target(&Method::GET, &url),
            "get /20160918/instances?compartmentId=ocid1.c&lifecycleState=RUNNING"
        );
    }

    #[test]
    fn test_host_header_keeps_explicit_port() {
        let url = Url::parse("http://127.0.0.1:8123/20160918/vnics/x").unwrap();
        assert_eq!(host_header(&url).unwrap(), "127.0.0.1:8123");

        let url = Url::parse("https://telemetry.us-ashburn-1.oraclecloud.com/").unwrap();
        assert_eq!(
            host_header(&url).unwrap(),
            "telemetry.us-ashburn-1.oraclecloud.com"
        );
    }

    #[test]
    fn test_get_signature_verifies() {
        let signer = ApiKeySigner::from_pem("tenancy/user/fp", PKCS1_KEY).unwrap();
        let url = Url::parse("https://iaas.eu-frankfurt-1.oraclecloud.com/20160918/instances/abc")
            .unwrap();
        let headers = signer
            .sign(&SignableRequest {
                method: &Method::GET,
                url: &url,
                body: None,
                date: date(),
            })
            .unwrap();

        let authorization = header(&headers, "authorization");
        assert!(authorization.starts_with("Signature version=\"1\",keyId=\"tenancy/user/fp\""));
        assert!(authorization.contains("headers=\"date (request-target) host\""));

        let expected = signing_string(&[
            ("date", http_date(date())),
            ("(request-target)", "get /20160918/instances/abc".to_string()),
            ("host", "iaas.eu-frankfurt-1.oraclecloud.com".to_string()),
        ]);
        let verifying: VerifyingKey<Sha256> = signer.key.verifying_key();
        let signature = Signature::try_from(signature_of(authorization).as_slice()).unwrap();
        assert!(verifying.verify(expected.as_bytes(), &signature).is_ok());
    }

    #[test]
    fn test_body_headers_are_signed() {
        let signer = ApiKeySigner::from_pem("t/u/f", PKCS8_KEY).unwrap();
        let url = Url::parse("https://telemetry.eu-frankfurt-1.oraclecloud.com/20180401/metrics")
            .unwrap();
        let body = br#"{"namespace":"oci_computeagent"}"#;
        let headers = signer
            .sign(&SignableRequest {
                method: &Method::POST,
                url: &url,
                body: Some(body),
                date: date(),
            })
            .unwrap();

        assert_eq!(header(&headers, "content-type"), JSON_CONTENT_TYPE);
        assert_eq!(
            header(&headers, "x-content-sha256"),
            STANDARD.encode(Sha256::digest(body))
        );
        assert!(header(&headers, "authorization").contains(
            "headers=\"date (request-target) host content-length content-type x-content-sha256\""
        ));
        assert!(headers.iter().all(|(name, _)| *name != "content-length"));
    }

    #[test]
    fn test_rejects_garbage_key() {
        let err = ApiKeySigner::from_pem("a/b/c", "not a key").unwrap_err();
        assert!(matches!(err, ConfigError::KeyError { .. }));
    }
}
