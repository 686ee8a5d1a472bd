//! Bundle objects and the bundle artifact.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::BundleError;

/// Prefix of every bundle id.
pub const BUNDLE_ID_PREFIX: &str = "bundle--";

// =============================================================================
// Bundle Objects
// =============================================================================

/// What bundle assembly needs to know about an item: its type tag and id.
pub trait BundleObject {
    /// Type tag, e.g. `"report"` or `"malware"`.
    fn type_tag(&self) -> &str;

    /// Identifier, e.g. `"report--<uuid>"`.
    fn object_id(&self) -> &str;
}

impl BundleObject for serde_json::Value {
    fn type_tag(&self) -> &str {
        self.get("type").and_then(|v| v.as_str()).unwrap_or_default()
    }

    fn object_id(&self) -> &str {
        self.get("id").and_then(|v| v.as_str()).unwrap_or_default()
    }
}

/// An extracted object: type tag, id, and every other property untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StixObject {
    #[serde(rename = "type")]
    pub type_tag: String,

    pub id: String,

    /// Remaining properties, preserved as-is.
    #[serde(flatten)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl StixObject {
    /// Create an object with no extra properties.
    pub fn new(type_tag: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            id: id.into(),
            properties: serde_json::Map::new(),
        }
    }

    /// Add a property.
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

impl BundleObject for StixObject {
    fn type_tag(&self) -> &str {
        &self.type_tag
    }

    fn object_id(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// A root object aggregating a drained collection.
///
/// Immutable once built. `objects` keeps the drain order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle<T> {
    #[serde(rename = "type")]
    kind: String,
    id: String,
    spec_version: String,
    objects: Vec<T>,
}

impl<T> Bundle<T> {
    /// Build a bundle named after `root_id` (which may be empty).
    pub fn new(root_id: &str, spec_version: impl Into<String>, objects: Vec<T>) -> Self {
        Self {
            kind: "bundle".to_string(),
            id: format!("{BUNDLE_ID_PREFIX}{root_id}"),
            spec_version: spec_version.into(),
            objects,
        }
    }

    /// Always `"bundle"`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// `"bundle--<root id>"`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The root item's id, empty if the bundle has no root.
    pub fn root_id(&self) -> &str {
        self.id.strip_prefix(BUNDLE_ID_PREFIX).unwrap_or_default()
    }

    pub fn spec_version(&self) -> &str {
        &self.spec_version
    }

    pub fn objects(&self) -> &[T] {
        &self.objects
    }

    /// File name offered for download: `bundle--<uuid>.json`.
    ///
    /// `<uuid>` is the segment after the root id's `--` separator
    /// (`report--abc` gives `bundle--abc.json`). A root id without a
    /// separator is used whole.
    pub fn download_file_name(&self) -> String {
        let root = self.root_id();
        let uuid = root.split("--").nth(1).unwrap_or(root);
        format!("{BUNDLE_ID_PREFIX}{uuid}.json")
    }
}

impl<T: Serialize> Bundle<T> {
    /// Serialize as pretty-printed UTF-8 JSON.
    pub fn to_json_pretty(&self) -> Result<String, BundleError> {
        serde_json::to_string_pretty(self).map_err(|e| BundleError::Serialize(e.to_string()))
    }

    /// Write the bundle into `dir` under [`download_file_name`](Self::download_file_name).
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, BundleError> {
        let path = dir.join(self.download_file_name());
        let json = self.to_json_pretty()?;
        std::fs::write(&path, json).map_err(|e| BundleError::Io(e.to_string()))?;
        tracing::info!(
            "Wrote bundle {} ({} objects) to {}",
            self.id,
            self.objects.len(),
            path.display()
        );
        Ok(path)
    }
}
