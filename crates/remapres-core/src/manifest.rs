//! Package manifest (`package.json`) view.
//!
//! Only the fields the resolver consumes are interpreted: `main` and the
//! platform remap declaration (`browser`, with a legacy alias).

use crate::error::{Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// A parsed manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    path: PathBuf,
    value: Value,
}

/// Platform remap declaration found in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemapDeclaration {
    /// `"browser": "./alt.js"`: replace the package's main file.
    Main(String),
    /// `"browser": false`: the package's main file becomes empty.
    Disabled,
    /// `"browser": { ... }`: per-file remaps, in declaration order.
    Map(Vec<(String, RemapValue)>),
}

/// Right-hand side of an object-form remap entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemapValue {
    Specifier(String),
    Disabled,
}

impl Manifest {
    /// Parse manifest text.
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Result<Self> {
        let path = path.into();
        match serde_json::from_str(text) {
            Ok(value) => Ok(Self { path, value }),
            Err(source) => Err(Error::ManifestParse { path, source }),
        }
    }

    /// Wrap an already-parsed value.
    #[must_use]
    pub fn from_value(path: impl Into<PathBuf>, value: Value) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }

    /// Path of the manifest file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw JSON value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The `main` field, if it is a non-empty string.
    #[must_use]
    pub fn main(&self) -> Option<&str> {
        self.value
            .get("main")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
    }

    /// Read the remap declaration.
    ///
    /// `legacy` is consulted only when `field` is absent; a present `null`
    /// declares nothing. `true`, numbers and arrays also declare nothing.
    pub fn remap_declaration(
        &self,
        field: &str,
        legacy: Option<&str>,
    ) -> Result<Option<RemapDeclaration>> {
        let Some(decl) = self
            .value
            .get(field)
            .or_else(|| legacy.and_then(|l| self.value.get(l)))
        else {
            return Ok(None);
        };

        let decl = match decl {
            Value::String(target) => Some(RemapDeclaration::Main(target.clone())),
            Value::Bool(false) => Some(RemapDeclaration::Disabled),
            Value::Object(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (key, value) in map {
                    let value = match value {
                        Value::String(s) => RemapValue::Specifier(s.clone()),
                        Value::Bool(false) => RemapValue::Disabled,
                        _ => {
                            return Err(Error::InvalidRemapValue {
                                field: field.to_string(),
                                manifest: self.path.clone(),
                                key: key.clone(),
                            })
                        }
                    };
                    entries.push((key.clone(), value));
                }
                Some(RemapDeclaration::Map(entries))
            }
            _ => None,
        };
        Ok(decl)
    }
}
