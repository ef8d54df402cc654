//! Provider configuration discovery
//!
//! Reads the standard OCI config file (`~/.oci/config`), an INI file with one
//! section per profile. Keys missing from a profile are inherited from the
//! `[DEFAULT]` section, the same way the OCI SDKs and CLI resolve them.

pub mod error;
pub mod profile;

pub use error::{ConfigError, Result};
pub use profile::{DEFAULT_PROFILE, OciConfig};
