pub mod remaps;
pub mod resolve;
pub mod version;

use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};

/// Directory to resolve from: `from` relative to `cwd`, canonicalized.
pub fn base_dir(cwd: &Path, from: Option<&Path>) -> Result<PathBuf> {
    let dir = from.map_or_else(|| cwd.to_path_buf(), |f| cwd.join(f));
    dunce::canonicalize(&dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("Invalid directory: {}", dir.display()))
}
