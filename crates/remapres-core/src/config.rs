use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default extensions for probing, in Node's registration order.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".json", ".node"];

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Extensions to probe (in order).
    pub extensions: Vec<String>,

    /// Native addon extension, never probed.
    pub native_extension: String,

    /// Manifest file name looked up in each directory.
    pub manifest_name: String,

    /// Name of the installed-packages directory.
    pub modules_dir: String,

    /// Manifest field holding platform remaps.
    pub remap_field: String,

    /// Fallback field, consulted only when `remap_field` is absent.
    pub legacy_remap_field: Option<String>,

    /// Main specifier used when a manifest has no `main`.
    pub default_main: String,

    /// Fail on malformed manifests instead of treating them as absent.
    pub strict_manifests: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            native_extension: ".node".to_string(),
            manifest_name: "package.json".to_string(),
            modules_dir: "node_modules".to_string(),
            remap_field: "browser".to_string(),
            legacy_remap_field: Some("browserify".to_string()),
            default_main: "./index".to_string(),
            strict_manifests: true,
        }
    }
}

impl ResolverConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Set probed extensions.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the remap field and its legacy alias.
    #[must_use]
    pub fn with_remap_field(mut self, field: impl Into<String>, legacy: Option<String>) -> Self {
        self.remap_field = field.into();
        self.legacy_remap_field = legacy;
        self
    }

    /// Set strict manifest parsing.
    #[must_use]
    pub fn with_strict_manifests(mut self, strict: bool) -> Self {
        self.strict_manifests = strict;
        self
    }
}
