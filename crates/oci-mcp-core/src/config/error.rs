//! Error types for OCI configuration loading

use thiserror::Error;

/// Errors that can occur while discovering provider configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found at {path}")]
    NotFound { path: String },

    #[error("Failed to load config from {path}: {source}")]
    LoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] ini::ParseError),

    #[error("Profile '{name}' not found in config file")]
    ProfileNotFound { name: String },

    #[error("Profile '{profile}' is missing required key '{key}'")]
    MissingKey { profile: String, key: &'static str },

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("Failed to load API signing key from {path}: {reason}")]
    KeyError { path: String, reason: String },

    #[error("Failed to determine home directory")]
    ConfigDirError,
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
