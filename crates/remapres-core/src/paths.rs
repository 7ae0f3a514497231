//! Lexical path helpers.
//!
//! Nothing here touches the filesystem.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Normalize a path lexically: drop `.` components and fold `..` into
/// the preceding component. Symlinks are not resolved.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` stays at the root
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Join a specifier onto a directory and normalize the result.
#[must_use]
pub fn join_normalized(dir: &Path, spec: &str) -> PathBuf {
    normalize(&dir.join(spec))
}

/// Append an extension without replacing an existing one (`a.min` + `.js` = `a.min.js`).
#[must_use]
pub fn with_appended_extension(path: &Path, ext: &str) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_os_string();
    s.push(ext);
    PathBuf::from(s)
}

/// The dotted extension of a path's file name, if any (`foo.json` -> `.json`).
#[must_use]
pub fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}

/// Check if a specifier is an absolute path on this platform.
///
/// Drive (`C:\`, `D:/`) and UNC (`\\server\share`) forms only count on Windows.
#[must_use]
pub fn is_absolute_specifier(spec: &str) -> bool {
    if spec.starts_with('/') {
        return true;
    }

    #[cfg(windows)]
    {
        let bytes = spec.as_bytes();
        let drive = bytes.len() >= 3
            && bytes[0].is_ascii_alphabetic()
            && bytes[1] == b':'
            && (bytes[2] == b'\\' || bytes[2] == b'/');
        drive || spec.starts_with("\\\\")
    }

    #[cfg(not(windows))]
    {
        false
    }
}

/// Split a bare specifier into package name and optional sub-path.
///
/// `lodash/fp` -> (`lodash`, `fp`), `@scope/pkg/sub` -> (`@scope/pkg`, `sub`).
/// An empty sub-path (`pkg/`) is treated as none.
#[must_use]
pub fn parse_bare_specifier(spec: &str) -> (&str, Option<&str>) {
    let split_at = if spec.starts_with('@') {
        spec.match_indices('/').nth(1).map(|(i, _)| i)
    } else {
        spec.find('/')
    };

    match split_at {
        Some(i) => {
            let sub = &spec[i + 1..];
            (&spec[..i], (!sub.is_empty()).then_some(sub))
        }
        None => (spec, None),
    }
}

/// Package search paths for `from`, closest first.
///
/// Every ancestor contributes `<ancestor>/<modules_dir>`, except ancestors that
/// are themselves a modules directory.
#[must_use]
pub fn module_search_paths(from: &Path, modules_dir: &str) -> Vec<PathBuf> {
    from.ancestors()
        .filter(|dir| dir.file_name().map_or(true, |name| name != modules_dir))
        .map(|dir| dir.join(modules_dir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_dots() {
        assert_eq!(normalize(Path::new("/a/b/./c/../d")), PathBuf::from("/a/b/d"));
        assert_eq!(normalize(Path::new("/a/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(normalize(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn test_join_normalized() {
        let dir = Path::new("/proj/src");
        assert_eq!(join_normalized(dir, "."), PathBuf::from("/proj/src"));
        assert_eq!(join_normalized(dir, "./"), PathBuf::from("/proj/src"));
        assert_eq!(join_normalized(dir, "../lib/x"), PathBuf::from("/proj/lib/x"));
    }

    #[test]
    fn test_appended_extension_keeps_existing() {
        assert_eq!(
            with_appended_extension(Path::new("/a/jquery.min"), ".js"),
            PathBuf::from("/a/jquery.min.js")
        );
        assert_eq!(dotted_extension(Path::new("/a/foo.json")).as_deref(), Some(".json"));
        assert_eq!(dotted_extension(Path::new("/a/foo")), None);
        assert_eq!(dotted_extension(Path::new("/a/.bashrc")), None);
    }

    #[test]
    fn test_is_absolute_specifier() {
        assert!(is_absolute_specifier("/usr/lib/x.js"));
        assert!(!is_absolute_specifier("./x"));
        assert!(!is_absolute_specifier("lodash"));
        assert!(!is_absolute_specifier("c:"));
    }

    #[test]
    #[cfg(windows)]
    fn test_windows_absolute_forms() {
        assert!(is_absolute_specifier("C:\\x.js"));
        assert!(is_absolute_specifier("d:/x.js"));
        assert!(is_absolute_specifier("\\\\server\\share"));
    }

    #[test]
    #[cfg(not(windows))]
    fn test_windows_forms_are_not_absolute_elsewhere() {
        assert!(!is_absolute_specifier("C:\\x.js"));
        assert!(!is_absolute_specifier("d:/x.js"));
        assert!(!is_absolute_specifier("\\\\server\\share"));
    }

    #[test]
    fn test_parse_bare_specifier() {
        assert_eq!(parse_bare_specifier("lodash"), ("lodash", None));
        assert_eq!(parse_bare_specifier("lodash/fp"), ("lodash", Some("fp")));
        assert_eq!(parse_bare_specifier("mypkg/lib/util"), ("mypkg", Some("lib/util")));
        assert_eq!(parse_bare_specifier("@scope/pkg"), ("@scope/pkg", None));
        assert_eq!(parse_bare_specifier("@scope/pkg/a/b"), ("@scope/pkg", Some("a/b")));
        assert_eq!(parse_bare_specifier("pkg/"), ("pkg", None));
    }

    #[test]
    fn test_module_search_paths_skip_modules_dirs() {
        let paths = module_search_paths(Path::new("/proj/node_modules/foo/lib"), "node_modules");
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/proj/node_modules/foo/lib/node_modules"),
                PathBuf::from("/proj/node_modules/foo/node_modules"),
                PathBuf::from("/proj/node_modules"),
                PathBuf::from("/node_modules"),
            ]
        );
    }
}
