//! Settings resolved by the binary and handed to [`ProviderAdapter::initialize`]
//!
//! [`ProviderAdapter::initialize`]: super::ProviderAdapter::initialize

use std::path::PathBuf;
use std::time::Duration;

use crate::config::DEFAULT_PROFILE;
use crate::transport::cli::{DEFAULT_CLI_PROGRAM, DEFAULT_CLI_TIMEOUT};
use crate::transport::rest::Endpoints;

/// Default REST request timeout
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct AdapterSettings {
    /// OCI config file; `~/.oci/config` when unset
    pub config_file: Option<PathBuf>,
    pub profile: String,
    /// Default scope that takes precedence over the tenancy
    pub compartment_override: Option<String>,
    pub cli_program: PathBuf,
    pub cli_timeout: Duration,
    pub api_timeout: Duration,
    /// Service base URLs; derived from the configured region when unset
    pub endpoints: Option<Endpoints>,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            config_file: None,
            profile: DEFAULT_PROFILE.to_string(),
            compartment_override: None,
            cli_program: PathBuf::from(DEFAULT_CLI_PROGRAM),
            cli_timeout: DEFAULT_CLI_TIMEOUT,
            api_timeout: DEFAULT_API_TIMEOUT,
            endpoints: None,
        }
    }
}
