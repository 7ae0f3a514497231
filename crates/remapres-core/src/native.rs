//! Last-resort resolution of runtime built-in modules.

use std::path::{Path, PathBuf};

/// Resolves specifiers that name runtime built-ins (`path`, `fs`, ...).
///
/// Consulted only after the package search fails. Best effort: never errors.
pub trait NativeResolver: Send + Sync + std::fmt::Debug {
    fn try_resolve_builtin(&self, from_dir: &Path, specifier: &str) -> Option<PathBuf>;
}

/// Node.js core modules that can be required without a `node:` prefix.
pub const NODE_BUILTINS: &[&str] = &[
    "assert",
    "assert/strict",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "dns/promises",
    "domain",
    "events",
    "fs",
    "fs/promises",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "path/posix",
    "path/win32",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "readline/promises",
    "repl",
    "stream",
    "stream/consumers",
    "stream/promises",
    "stream/web",
    "string_decoder",
    "sys",
    "timers",
    "timers/promises",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "util/types",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Resolves Node.js core module names to themselves, like `require.resolve`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeBuiltins;

impl NodeBuiltins {
    /// Whether `specifier` names a core module.
    #[must_use]
    pub fn is_builtin(specifier: &str) -> bool {
        match specifier.strip_prefix("node:") {
            // node: accepts every core module, including prefix-only ones like node:test
            Some(name) => !name.is_empty() && (NODE_BUILTINS.contains(&name) || name == "test"),
            None => NODE_BUILTINS.contains(&specifier),
        }
    }
}

impl NativeResolver for NodeBuiltins {
    fn try_resolve_builtin(&self, _from_dir: &Path, specifier: &str) -> Option<PathBuf> {
        Self::is_builtin(specifier).then(|| PathBuf::from(specifier))
    }
}

/// Never resolves anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBuiltins;

impl NativeResolver for NoBuiltins {
    fn try_resolve_builtin(&self, _from_dir: &Path, _specifier: &str) -> Option<PathBuf> {
        None
    }
}
