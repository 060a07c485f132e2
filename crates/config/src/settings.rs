// Settings file: provider endpoints, timeouts, registry override
//
// Credentials are NEVER stored here; see `credentials`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const REGRID: &str = "regrid";
pub const SMARTY: &str = "smarty";
pub const MELISSA: &str = "melissa";

/// Endpoint and behavior for one data provider. Unset values fall back to
/// the provider's built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    pub enabled: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: None,
            enabled: true,
        }
    }
}

/// Built-in endpoint and timeout for a known provider id.
pub fn provider_defaults(id: &str) -> Option<(&'static str, u64)> {
    match id {
        REGRID => Some(("https://app.regrid.com/api/v2/parcels/address", 10)),
        SMARTY => Some(("https://us-enrichment.api.smarty.com/lookup/search/property/principal", 10)),
        MELISSA => Some(("https://property.melissadata.net/v4/WEB/LookupProperty", 30)),
        _ => None,
    }
}

/// Provider settings with defaults filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProvider {
    pub id: &'static str,
    pub base_url: String,
    pub timeout_secs: u64,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Providers {
    pub regrid: ProviderSettings,
    pub smarty: ProviderSettings,
    pub melissa: ProviderSettings,
}

impl Providers {
    /// Effective settings for a provider id (case-insensitive).
    pub fn resolve(&self, id: &str) -> Option<ResolvedProvider> {
        let (id, configured) = match id.to_ascii_lowercase().as_str() {
            REGRID => (REGRID, &self.regrid),
            SMARTY => (SMARTY, &self.smarty),
            MELISSA => (MELISSA, &self.melissa),
            _ => return None,
        };
        let (default_url, default_timeout) = provider_defaults(id)?;
        Some(ResolvedProvider {
            id,
            base_url: configured.base_url.clone().unwrap_or_else(|| default_url.to_string()),
            timeout_secs: configured.timeout_secs.unwrap_or(default_timeout),
            enabled: configured.enabled,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// External field-registry TOML. `None` uses the embedded registry.
    pub registry: Option<PathBuf>,

    /// Separator between parent and child keys when flattening payloads.
    pub separator: String,

    pub providers: Providers,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry: None,
            separator: "_".to_string(),
            providers: Providers::default(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("parcelcheck")
            .join("settings.toml")
    }

    /// Load from the default location, falling back to defaults when absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let settings: Self = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }
}
