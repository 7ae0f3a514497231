use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Stable error codes, suitable for JSON output.
pub mod codes {
    pub const IO_ERROR: &str = "IO_ERROR";
    pub const CONFIG_READ_FAILED: &str = "CONFIG_READ_FAILED";
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";
    pub const MANIFEST_READ_FAILED: &str = "MANIFEST_READ_FAILED";
    pub const MANIFEST_INVALID: &str = "MANIFEST_INVALID";
    pub const REMAP_MAIN_NOT_FOUND: &str = "REMAP_MAIN_NOT_FOUND";
    pub const REMAP_NOT_FOUND: &str = "REMAP_NOT_FOUND";
    pub const REMAP_VALUE_INVALID: &str = "REMAP_VALUE_INVALID";
    pub const MAIN_NOT_FOUND: &str = "MAIN_NOT_FOUND";
    pub const REMAP_CYCLE: &str = "REMAP_CYCLE";
}

/// Which side of a remap entry failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemapRole {
    Source,
    Target,
}

impl fmt::Display for RemapRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

/// Core error type for remapres operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read manifest at {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest at {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid \"{field}\" field in \"{}\". Module not found: {}", manifest.display(), dir.display())]
    UnresolvedMain {
        field: String,
        manifest: PathBuf,
        dir: PathBuf,
    },

    #[error("Invalid \"{field}\" field in \"{}\". Remap {role} not found: {specifier}", manifest.display())]
    UnresolvedRemap {
        field: String,
        manifest: PathBuf,
        specifier: String,
        role: RemapRole,
    },

    #[error("Invalid \"{field}\" field in \"{}\". Value for {key:?} must be a string or false", manifest.display())]
    InvalidRemapValue {
        field: String,
        manifest: PathBuf,
        key: String,
    },

    #[error("Main file not found for {} (main: {main})", dir.display())]
    MainNotFound { dir: PathBuf, main: String },

    #[error("Remap cycle detected: {}", format_chain(chain))]
    RemapCycle { chain: Vec<PathBuf> },
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl Error {
    /// Stable code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => codes::IO_ERROR,
            Self::ConfigRead { .. } => codes::CONFIG_READ_FAILED,
            Self::ConfigParse { .. } => codes::CONFIG_INVALID,
            Self::ManifestRead { .. } => codes::MANIFEST_READ_FAILED,
            Self::ManifestParse { .. } => codes::MANIFEST_INVALID,
            Self::UnresolvedMain { .. } => codes::REMAP_MAIN_NOT_FOUND,
            Self::UnresolvedRemap { .. } => codes::REMAP_NOT_FOUND,
            Self::InvalidRemapValue { .. } => codes::REMAP_VALUE_INVALID,
            Self::MainNotFound { .. } => codes::MAIN_NOT_FOUND,
            Self::RemapCycle { .. } => codes::REMAP_CYCLE,
        }
    }

    /// Whether this error comes from a bad manifest declaration rather than I/O.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedMain { .. }
                | Self::UnresolvedRemap { .. }
                | Self::InvalidRemapValue { .. }
                | Self::MainNotFound { .. }
                | Self::RemapCycle { .. }
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
