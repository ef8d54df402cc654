//! OCI config file profiles

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use ini::{Ini, ParseOption};
use tracing::debug;

use super::error::{ConfigError, Result};

/// Profile used when none is requested
pub const DEFAULT_PROFILE: &str = "DEFAULT";

const REQUIRED_KEYS: &[&str] = &["user", "fingerprint", "key_file", "tenancy", "region"];

/// Resolved credentials and placement for one profile
#[derive(Debug, Clone, PartialEq)]
pub struct OciConfig {
    /// Profile name the values were read from
    pub profile: String,
    /// User OCID
    pub user: String,
    /// API key fingerprint (`aa:bb:...`)
    pub fingerprint: String,
    /// Path to the PEM private key, `~` and `${VAR}` expanded
    pub key_file: PathBuf,
    /// Tenancy OCID, also the default compartment
    pub tenancy: String,
    /// Region identifier such as `eu-frankfurt-1`
    pub region: String,
}

impl OciConfig {
    /// Default config location: `~/.oci/config`
    pub fn default_path() -> Result<PathBuf> {
        let base_dirs = BaseDirs::new().ok_or(ConfigError::ConfigDirError)?;
        Ok(base_dirs.home_dir().join(".oci").join("config"))
    }

    /// Load a profile from `path`, or from the default location when `None`
    pub fn load(path: Option<&Path>, profile: &str) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::LoadError {
            path: path.display().to_string(),
            source: e,
        })?;

        debug!(path = %path.display(), profile, "Loading OCI config");
        Self::from_ini_str(&content, profile)
    }

    /// Parse INI `content` and resolve `profile`, inheriting from `[DEFAULT]`
    pub fn from_ini_str(content: &str, profile: &str) -> Result<Self> {
        let sections = parse_sections(content)?;

        let selected = find_section(&sections, profile);
        let defaults = find_section(&sections, DEFAULT_PROFILE);

        if selected.is_none() {
            return Err(ConfigError::ProfileNotFound {
                name: profile.to_string(),
            });
        }

        let lookup = |key: &'static str| -> Result<String> {
            [selected, defaults]
                .into_iter()
                .flatten()
                .find_map(|section| find_value(section, key))
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ConfigError::MissingKey {
                    profile: profile.to_string(),
                    key,
                })
        };

        let mut values = HashMap::new();
        for key in REQUIRED_KEYS {
            values.insert(*key, lookup(key)?);
        }

        let config = OciConfig {
            profile: profile.to_string(),
            user: values.remove("user").unwrap_or_default(),
            fingerprint: values.remove("fingerprint").unwrap_or_default(),
            key_file: expand_path(&values.remove("key_file").unwrap_or_default())?,
            tenancy: values.remove("tenancy").unwrap_or_default(),
            region: values.remove("region").unwrap_or_default(),
        };
        config.validate()?;

        Ok(config)
    }

    /// Check OCID and fingerprint formats
    pub fn validate(&self) -> Result<()> {
        if !self.user.starts_with("ocid") {
            return Err(ConfigError::InvalidValue {
                key: "user",
                reason: "expected a user OCID".to_string(),
            });
        }
        if !self.tenancy.starts_with("ocid") {
            return Err(ConfigError::InvalidValue {
                key: "tenancy",
                reason: "expected a tenancy OCID".to_string(),
            });
        }

        let octets: Vec<&str> = self.fingerprint.split(':').collect();
        let well_formed = octets.len() == 16
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
        if !well_formed {
            return Err(ConfigError::InvalidValue {
                key: "fingerprint",
                reason: "expected 16 colon-separated hex octets".to_string(),
            });
        }

        Ok(())
    }

    /// Key id used in request signatures: `<tenancy>/<user>/<fingerprint>`
    pub fn key_id(&self) -> String {
        format!("{}/{}/{}", self.tenancy, self.user, self.fingerprint)
    }

    /// Shortened tenancy for logs and status output
    pub fn tenancy_preview(&self) -> String {
        let preview: String = self.tenancy.chars().take(20).collect();
        format!("{}...", preview)
    }
}

type Sections = HashMap<String, HashMap<String, String>>;

/// Section names are kept verbatim, so `[oc1.prod]` is just another profile.
/// Quotes and backslashes in values are literal, as in Windows key paths.
fn parse_sections(content: &str) -> Result<Sections> {
    let options = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..Default::default()
    };
    let ini = Ini::load_from_str_opt(content, options)?;

    let mut sections = Sections::new();
    for (name, properties) in ini.iter() {
        let Some(name) = name else {
            continue;
        };
        let section = sections.entry(name.to_string()).or_default();
        for (key, value) in properties.iter() {
            section.insert(key.to_string(), value.to_string());
        }
    }
    Ok(sections)
}

fn find_section<'a>(sections: &'a Sections, name: &str) -> Option<&'a HashMap<String, String>> {
    sections.get(name).or_else(|| {
        sections
            .iter()
            .find(|(section, _)| section.eq_ignore_ascii_case(name))
            .map(|(_, values)| values)
    })
}

fn find_value(section: &HashMap<String, String>, key: &str) -> Option<String> {
    section
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.trim().to_string())
}

fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw).map_err(|e| ConfigError::InvalidValue {
        key: "key_file",
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.as_ref()))
}
