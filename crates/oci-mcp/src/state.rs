//! Application state shared by every tool

use std::path::PathBuf;
use std::sync::Arc;

use oci_mcp_core::config::OciConfig;
use oci_mcp_core::{AdapterSettings, Clock, CoreError, ProviderAdapter, SystemClock};

/// Shared application state
///
/// Built once in `main` and only read afterwards.
pub struct AppState {
    /// Provider adapter (REST clients plus CLI fallback)
    pub adapter: ProviderAdapter,
    /// Source of "now" for time ranges and envelope timestamps
    pub clock: Arc<dyn Clock>,
    /// Explicit config file location, if one was given
    config_file: Option<PathBuf>,
}

impl AppState {
    /// Initialize the adapter from resolved settings.
    ///
    /// Never fails; configuration problems leave the adapter in CLI-only mode.
    pub fn new(settings: &AdapterSettings) -> Self {
        Self {
            adapter: ProviderAdapter::initialize(settings),
            clock: Arc::new(SystemClock),
            config_file: settings.config_file.clone(),
        }
    }

    /// Create state around a pre-built adapter (for testing)
    pub fn with_adapter(adapter: ProviderAdapter) -> Self {
        Self {
            adapter,
            clock: Arc::new(SystemClock),
            config_file: None,
        }
    }

    /// Replace the clock (for testing)
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Record an explicit config file location
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// The config file the adapter reads: explicit path or `~/.oci/config`
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config_file
            .clone()
            .or_else(|| OciConfig::default_path().ok())
    }

    /// Resolve the compartment for a request.
    ///
    /// A non-empty argument wins, then the adapter's default scope.
    pub fn resolve_scope(&self, compartment_id: Option<&str>) -> Result<String, CoreError> {
        compartment_id
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .or_else(|| self.adapter.get_default_scope())
            .ok_or(CoreError::RequiredInputMissing("compartment_id"))
    }
}
