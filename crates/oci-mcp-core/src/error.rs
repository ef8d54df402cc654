//! Unified error handling for oci-mcp-core
//!
//! Every adapter operation that can fail returns [`CoreError`]. The transport
//! specific errors ([`ApiError`](crate::transport::rest::ApiError),
//! [`CliError`](crate::transport::cli::CliError)) and the config file error
//! ([`ConfigError`](crate::config::ConfigError)) convert into it so tool
//! handlers only deal with one type.
//!
//! # Example
//!
//! ```rust
//! use oci_mcp_core::{CoreError, TransportKind};
//!
//! let err = CoreError::transport(TransportKind::Cli, "CLI command failed: boom");
//! assert!(err.is_transport());
//! assert!(err.to_string().contains("boom"));
//! ```

use thiserror::Error;

use crate::adapter::Operation;
use crate::config::ConfigError;
use crate::transport::TransportKind;
use crate::transport::cli::CliError;
use crate::transport::rest::ApiError;

/// Core error type for provider operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// No provider configuration was loaded, or a sub-client is missing
    #[error("OCI configuration unavailable: {0}")]
    ConfigurationUnavailable(String),

    /// A required input could not be resolved from arguments or defaults
    #[error("{0} is required")]
    RequiredInputMissing(&'static str),

    /// The structured client or the command-line call failed
    #[error("{transport} request failed: {message}")]
    Transport {
        transport: TransportKind,
        message: String,
    },

    /// The operation has no command-line equivalent and the API client is absent
    #[error("{0} requires the OCI API client (no CLI fallback available)")]
    UnsupportedFallback(Operation),

    /// Unparseable input such as a time expression or lifecycle state
    #[error("{0}")]
    MalformedInput(String),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Build a transport failure carrying the underlying message
    pub fn transport(transport: TransportKind, message: impl Into<String>) -> Self {
        CoreError::Transport {
            transport,
            message: message.into(),
        }
    }

    /// Returns true if this is a transport (network, auth, process) failure
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, CoreError::Transport { .. })
    }

    /// Returns true if the failure is due to missing configuration
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CoreError::ConfigurationUnavailable(_) | CoreError::UnsupportedFallback(_)
        )
    }

    /// Returns true if the caller supplied (or failed to supply) bad input
    #[must_use]
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            CoreError::RequiredInputMissing(_) | CoreError::MalformedInput(_)
        )
    }
}

impl From<ApiError> for CoreError {
    fn from(err: ApiError) -> Self {
        CoreError::transport(TransportKind::Api, err.to_string())
    }
}

impl From<CliError> for CoreError {
    fn from(err: CliError) -> Self {
        CoreError::transport(TransportKind::Cli, err.to_string())
    }
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        CoreError::ConfigurationUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_input_message() {
        let err = CoreError::RequiredInputMissing("Compartment ID");
        assert_eq!(err.to_string(), "Compartment ID is required");
        assert!(err.is_input());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_unsupported_fallback_names_operation() {
        let err = CoreError::UnsupportedFallback(Operation::GetInstanceDetails);
        assert!(err.to_string().contains("get_instance_details"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_cli_error_converts_to_transport() {
        let err: CoreError = CliError::Failed {
            status: Some(2),
            stderr: "ServiceError: NotAuthorizedOrNotFound".to_string(),
        }
        .into();

        match &err {
            CoreError::Transport { transport, message } => {
                assert_eq!(*transport, TransportKind::Cli);
                assert!(message.contains("NotAuthorizedOrNotFound"));
            }
            other => panic!("Expected Transport, got {:?}", other),
        }
    }

    #[test]
    fn test_api_error_converts_to_transport() {
        let err: CoreError = ApiError::Status {
            status: 401,
            code: Some("NotAuthenticated".to_string()),
            message: "The required information to complete authentication was not provided"
                .to_string(),
        }
        .into();

        assert!(err.is_transport());
        assert!(err.to_string().contains("NotAuthenticated"));
    }

    #[test]
    fn test_config_error_converts_to_configuration_unavailable() {
        let err: CoreError = ConfigError::MissingKey {
            profile: "DEFAULT".to_string(),
            key: "tenancy",
        }
        .into();

        assert!(err.is_configuration());
        assert!(err.to_string().contains("tenancy"));
    }
}
