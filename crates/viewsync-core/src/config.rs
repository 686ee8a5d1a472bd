//! Configuration types.
//!
//! Configuration lives in `<config dir>/viewsync/config.toml`. Every field has
//! a default, so a missing file or a partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How the UI's 0-based page index maps to the server's `page` param.
    pub page_index: PageIndexConvention,

    /// Page size requested by list views.
    pub page_size: u32,

    /// How sorting is sent to the server.
    pub sort_param: SortParamStyle,

    /// Bundle assembly settings
    pub bundle: BundleConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_index: PageIndexConvention::default(),
            page_size: 10,
            sort_param: SortParamStyle::default(),
            bundle: BundleConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from an explicit file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `config.toml` from the config directory, or defaults if absent.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = config_path().ok_or(ConfigError::NoConfigDir)?;
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(&path)
    }
}

/// Page numbering convention for requests.
///
/// The UI always counts pages from 0. One convention is applied to every
/// list request rather than deciding per call site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageIndexConvention {
    /// Send `ui_page + 1`.
    #[default]
    OneBased,
    /// Send `ui_page` unchanged.
    ZeroBased,
}

impl PageIndexConvention {
    /// Convert a UI page index to the server's page number.
    pub fn to_server(self, ui_page: u32) -> u32 {
        match self {
            PageIndexConvention::OneBased => ui_page.saturating_add(1),
            PageIndexConvention::ZeroBased => ui_page,
        }
    }

    /// Convert a server page number back to a UI page index.
    pub fn to_ui(self, server_page: u32) -> u32 {
        match self {
            PageIndexConvention::OneBased => server_page.saturating_sub(1),
            PageIndexConvention::ZeroBased => server_page,
        }
    }
}

/// How sort parameters are encoded in list requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortParamStyle {
    /// `sort_field=<field>&sort_order=<asc|desc>`
    #[default]
    FieldAndOrder,
    /// `order_by=<field>` ascending, `order_by=-<field>` descending.
    OrderBy,
}

/// Bundle assembly configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Type tag of the item whose id names the bundle.
    pub root_type: String,

    /// `spec_version` written into every bundle.
    pub spec_version: String,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            root_type: "report".to_string(),
            spec_version: "2.1".to_string(),
        }
    }
}

/// Get the config directory path.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("viewsync"))
}

/// Get the path to `config.toml`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}
