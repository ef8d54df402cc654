//! `oci` command-line fallback transport
//!
//! Runs `oci compute instance list ... --output json` and maps the
//! kebab-case JSON it prints into [`Instance`] records. The CLI does not
//! report the region, so it is always `unknown`.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::Result;
use crate::model::{DefinedTags, Instance, LifecycleState, StringMap};
use crate::transport::{InstanceSource, TransportKind};

/// Default executable name
pub const DEFAULT_CLI_PROGRAM: &str = "oci";
/// Default wall-clock limit for one CLI invocation
pub const DEFAULT_CLI_TIMEOUT: Duration = Duration::from_secs(60);

const UNKNOWN: &str = "Unknown";
const CLI_REGION: &str = "unknown";

/// Errors from running the OCI CLI
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to run OCI CLI: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("OCI CLI timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("CLI command failed: {}", .stderr.trim())]
    Failed { status: Option<i32>, stderr: String },

    #[error("Failed to parse OCI CLI output: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
struct CliListResponse {
    #[serde(default)]
    data: Vec<CliInstance>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CliInstance {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    shape: Option<String>,
    #[serde(default)]
    lifecycle_state: Option<String>,
    #[serde(default)]
    availability_domain: Option<String>,
    #[serde(default)]
    compartment_id: Option<String>,
    #[serde(default)]
    time_created: Option<String>,
    #[serde(default)]
    image_id: Option<String>,
    #[serde(default)]
    fault_domain: Option<String>,
    #[serde(default)]
    metadata: Option<StringMap>,
    #[serde(default)]
    freeform_tags: Option<StringMap>,
    #[serde(default)]
    defined_tags: Option<DefinedTags>,
}

impl From<CliInstance> for Instance {
    fn from(cli: CliInstance) -> Self {
        let or_unknown = |value: Option<String>| value.unwrap_or_else(|| UNKNOWN.to_string());

        Instance {
            id: cli.id.unwrap_or_default(),
            display_name: or_unknown(cli.display_name),
            shape: or_unknown(cli.shape),
            lifecycle_state: LifecycleState::from_provider(
                cli.lifecycle_state.as_deref().unwrap_or(UNKNOWN),
            ),
            availability_domain: or_unknown(cli.availability_domain),
            fault_domain: cli.fault_domain,
            compartment_id: cli.compartment_id.unwrap_or_default(),
            region: CLI_REGION.to_string(),
            time_created: cli
                .time_created
                .as_deref()
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc)),
            image_id: cli.image_id,
            metadata: cli.metadata.unwrap_or_default(),
            freeform_tags: cli.freeform_tags.unwrap_or_default(),
            defined_tags: cli.defined_tags.unwrap_or_default(),
            ..Default::default()
        }
    }
}

/// Parse `oci ... --output json` list output. Blank output is an empty list.
pub fn parse_instance_list(stdout: &str) -> std::result::Result<Vec<Instance>, CliError> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }
    let response: CliListResponse = serde_json::from_str(stdout)?;
    Ok(response.data.into_iter().map(Instance::from).collect())
}

/// Runner for the `oci` executable
#[derive(Debug, Clone)]
pub struct OciCli {
    program: PathBuf,
    timeout: Duration,
    profile: Option<String>,
    config_file: Option<PathBuf>,
}

impl Default for OciCli {
    fn default() -> Self {
        Self::new(DEFAULT_CLI_PROGRAM, DEFAULT_CLI_TIMEOUT)
    }
}

impl OciCli {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
            profile: None,
            config_file: None,
        }
    }

    /// Profile passed to the CLI through `OCI_CLI_PROFILE`
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Config file passed to the CLI through `OCI_CLI_CONFIG_FILE`
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    /// Run the CLI with `args` and return its stdout
    pub async fn run(&self, args: &[&str]) -> std::result::Result<String, CliError> {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .env("SUPPRESS_LABEL_WARNING", "True")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(profile) = &self.profile {
            command.env("OCI_CLI_PROFILE", profile);
        }
        if let Some(path) = &self.config_file {
            command.env("OCI_CLI_CONFIG_FILE", path);
        }

        debug!(program = %self.program.display(), ?args, "Running OCI CLI");

        let child = command.spawn().map_err(CliError::Spawn)?;
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| CliError::Timeout(self.timeout))?
            .map_err(CliError::Spawn)?;

        if !output.status.success() {
            return Err(CliError::Failed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl InstanceSource for OciCli {
    fn kind(&self) -> TransportKind {
        TransportKind::Cli
    }

    async fn list_instances(
        &self,
        compartment_id: &str,
        lifecycle_state: LifecycleState,
    ) -> Result<Vec<Instance>> {
        info!(
            compartment_id = %compartment_id,
            lifecycle_state = %lifecycle_state,
            "Using CLI fallback for listing instances"
        );

        let stdout = self
            .run(&[
                "compute",
                "instance",
                "list",
                "--compartment-id",
                compartment_id,
                "--lifecycle-state",
                lifecycle_state.as_str(),
                "--output",
                "json",
            ])
            .await?;

        let instances = parse_instance_list(&stdout)?;
        info!(count = instances.len(), "Found instances via OCI CLI");
        Ok(instances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_output_is_empty() {
        assert!(parse_instance_list("").unwrap().is_empty());
        assert!(parse_instance_list("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_kebab_case_mapping() {
        let stdout = r#"{
            "data": [{
                "id": "ocid1.instance.oc1..a",
                "display-name": "batch-7",
                "shape": "VM.Standard.A1.Flex",
                "lifecycle-state": "STOPPED",
                "availability-domain": "Uocm:PHX-AD-2",
                "compartment-id": "ocid1.compartment.oc1..c",
                "time-created": "2024-05-01T10:00:00.000000+00:00",
                "fault-domain": "FAULT-DOMAIN-1",
                "freeform-tags": {"team": "data"},
                "defined-tags": {}
            }]
        }"#;

        let instances = parse_instance_list(stdout).unwrap();
        assert_eq!(instances.len(), 1);

        let instance = &instances[0];
        assert_eq!(instance.display_name, "batch-7");
        assert_eq!(instance.lifecycle_state, LifecycleState::Stopped);
        assert_eq!(instance.region, "unknown");
        assert!(instance.time_created.is_some());
        assert!(instance.image_id.is_none());
    }

    #[test]
    fn test_missing_fields_default_to_unknown() {
        let instances = parse_instance_list(r#"{"data": [{"id": "ocid1.instance.oc1..b"}]}"#).unwrap();

        let instance = &instances[0];
        assert_eq!(instance.display_name, "Unknown");
        assert_eq!(instance.shape, "Unknown");
        assert_eq!(instance.availability_domain, "Unknown");
        assert_eq!(instance.lifecycle_state, LifecycleState::Unknown);
        assert!(instance.metadata.is_empty());
    }

    #[test]
    fn test_missing_data_key() {
        assert!(parse_instance_list("{}").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_instance_list("not json"),
            Err(CliError::Decode(_))
        ));
    }

    #[test]
    fn test_failed_message_carries_stderr() {
        let err = CliError::Failed {
            status: Some(1),
            stderr: "ServiceError: 401\n".to_string(),
        };
        assert_eq!(err.to_string(), "CLI command failed: ServiceError: 401");
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let cli = OciCli::new("/nonexistent/oci-cli-binary", Duration::from_secs(5));
        let err = cli.run(&["--version"]).await.unwrap_err();
        assert!(matches!(err, CliError::Spawn(_)));
    }
}
