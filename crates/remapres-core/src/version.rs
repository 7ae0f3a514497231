use std::fmt::Write;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `remapres <version>`, plus the git hash when the build sets
/// `REMAPRES_BUILD_GIT_HASH`.
#[must_use]
pub fn version_string() -> String {
    let mut s = format!("remapres {VERSION}");

    if let Some(hash) = option_env!("REMAPRES_BUILD_GIT_HASH") {
        let _ = write!(s, " ({hash})");
    }

    s
}
