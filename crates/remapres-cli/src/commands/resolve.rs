//! `remapres resolve` command implementation.

use miette::{miette, IntoDiagnostic, Result};
use rayon::prelude::*;
use remapres_core::paths::normalize;
use remapres_core::resolver::PROVENANCE_SCHEMA_VERSION;
use remapres_core::{
    CacheStats, Provenance, RemapTable, RemapTarget, Resolution, ResolveOptions, Resolver, ResolverConfig,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Exit code when some specifier did not resolve.
pub const EXIT_NOT_FOUND: i32 = 1;
/// Exit code when some specifier failed with an error.
pub const EXIT_FAILED: i32 = 2;

/// Arguments for the resolve command.
#[derive(Debug, Clone)]
pub struct ResolveArgs {
    pub from: PathBuf,
    pub specifiers: Vec<String>,
    pub provenance: bool,
    pub remaps: Option<RemapTable>,
    pub stats: bool,
}

/// Resolve output for JSON.
#[derive(Serialize)]
struct ResolveJsonOutput<'a> {
    schema_version: u32,
    from: &'a Path,
    results: &'a [ResolveJsonResult],
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<CacheStats>,
}

#[derive(Serialize)]
struct ResolveJsonResult {
    specifier: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provenance: Option<Provenance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorInfo>,
}

#[derive(Serialize)]
struct ErrorInfo {
    code: &'static str,
    message: String,
}

/// Parse `FROM=TO` remap arguments; paths are taken relative to `cwd`.
pub fn parse_remaps(cwd: &Path, args: &[String]) -> Result<Option<RemapTable>> {
    if args.is_empty() {
        return Ok(None);
    }

    let mut table = RemapTable::new();
    for arg in args {
        let (from, to) = arg
            .split_once('=')
            .ok_or_else(|| miette!("Invalid remap {arg:?}: expected FROM=TO"))?;
        if from.is_empty() || to.is_empty() {
            return Err(miette!("Invalid remap {arg:?}: expected FROM=TO"));
        }

        let target = if to == "false" {
            RemapTarget::Empty
        } else {
            RemapTarget::Path(normalize(&cwd.join(to)))
        };
        table.insert(normalize(&cwd.join(from)), target);
    }
    Ok(Some(table))
}

/// Run the resolve command. Returns the process exit code.
pub fn run(config: ResolverConfig, args: &ResolveArgs, json: bool) -> Result<i32> {
    let resolver = Resolver::builder().config(config).build();
    let options = ResolveOptions {
        include_provenance: args.provenance,
        remaps: args.remaps.clone(),
    };

    let results: Vec<ResolveJsonResult> = args
        .specifiers
        .par_iter()
        .map(|spec| match resolver.resolve_with(&args.from, spec, &options) {
            Ok(out) => {
                let (status, path) = match out.resolution {
                    Resolution::Path(p) => ("resolved", Some(p)),
                    Resolution::Empty => ("empty", None),
                    Resolution::NotFound => ("not_found", None),
                };
                ResolveJsonResult {
                    specifier: spec.clone(),
                    status,
                    path,
                    provenance: out.provenance,
                    error: None,
                }
            }
            Err(e) => ResolveJsonResult {
                specifier: spec.clone(),
                status: "error",
                path: None,
                provenance: None,
                error: Some(ErrorInfo {
                    code: e.code(),
                    message: e.to_string(),
                }),
            },
        })
        .collect();

    let stats = args.stats.then(|| resolver.cache_stats());
    if let Some(stats) = &stats {
        debug!(
            resolved_hits = stats.resolved.hits,
            resolved_misses = stats.resolved.misses,
            table_hits = stats.flattened.hits,
            table_misses = stats.flattened.misses,
            "Cache statistics"
        );
    }

    if json {
        let output = ResolveJsonOutput {
            schema_version: PROVENANCE_SCHEMA_VERSION,
            from: &args.from,
            results: &results,
            stats,
        };
        let out = serde_json::to_string_pretty(&output).into_diagnostic()?;
        println!("{out}");
    } else {
        print_human(&results);
        if let Some(stats) = stats {
            print_stats(&stats);
        }
    }

    let code = if results.iter().any(|r| r.status == "error") {
        EXIT_FAILED
    } else if results.iter().any(|r| r.status == "not_found") {
        EXIT_NOT_FOUND
    } else {
        0
    };
    Ok(code)
}

fn print_human(results: &[ResolveJsonResult]) {
    for result in results {
        match (&result.path, &result.error) {
            (Some(path), _) => println!("{} -> {}", result.specifier, path.display()),
            (None, Some(err)) => {
                eprintln!("{}: error[{}]: {}", result.specifier, err.code, err.message);
            }
            (None, None) if result.status == "empty" => {
                println!("{} -> (empty)", result.specifier);
            }
            (None, None) => println!("{} -> (not found)", result.specifier),
        }

        if let Some(trail) = &result.provenance {
            for step in trail.steps() {
                println!("  {}", describe_step(step));
            }
        }
    }
}

fn print_stats(stats: &CacheStats) {
    eprintln!("cache stats:");
    for (name, counters) in [
        ("declared", stats.declared),
        ("flattened", stats.flattened),
        ("resolved", stats.resolved),
    ] {
        eprintln!(
            "  {name:<10} hits={} misses={}",
            counters.hits, counters.misses
        );
    }
}

fn describe_step(step: &remapres_core::ProvenanceStep) -> String {
    use remapres_core::ProvenanceStep;

    match step {
        ProvenanceStep::Main { dir, main } => {
            format!("main: {} -> {}", dir.display(), main.display())
        }
        ProvenanceStep::Installed {
            package_name,
            search_path,
        } => format!("installed: {package_name} in {}", search_path.display()),
        ProvenanceStep::Remap { from, to } => match to {
            RemapTarget::Path(to) => format!("remap: {} -> {}", from.display(), to.display()),
            RemapTarget::Empty => format!("remap: {} -> (empty)", from.display()),
        },
    }
}
