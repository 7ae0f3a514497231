//! `remapres remaps` command implementation.

use miette::{IntoDiagnostic, Result};
use remapres_core::{RemapTable, RemapTarget, Resolver, ResolverConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct RemapsJsonOutput<'a> {
    from: &'a Path,
    remaps: Vec<RemapEntry<'a>>,
}

#[derive(Serialize)]
struct RemapEntry<'a> {
    source: &'a PathBuf,
    target: &'a RemapTarget,
}

/// Run the remaps command.
pub fn run(config: ResolverConfig, from: &Path, json: bool) -> Result<()> {
    let resolver = Resolver::builder().config(config).build();
    let table = resolver.load_remap_table(from).into_diagnostic()?;
    let entries = sorted_entries(&table);

    if json {
        let output = RemapsJsonOutput {
            from,
            remaps: entries,
        };
        let out = serde_json::to_string_pretty(&output).into_diagnostic()?;
        println!("{out}");
        return Ok(());
    }

    if entries.is_empty() {
        println!("No remaps declared for {}", from.display());
        return Ok(());
    }

    for entry in entries {
        match entry.target {
            RemapTarget::Path(target) => {
                println!("{} -> {}", entry.source.display(), target.display());
            }
            RemapTarget::Empty => println!("{} -> false", entry.source.display()),
        }
    }
    Ok(())
}

fn sorted_entries(table: &RemapTable) -> Vec<RemapEntry<'_>> {
    let mut entries: Vec<_> = table
        .iter()
        .map(|(source, target)| RemapEntry { source, target })
        .collect();
    entries.sort_by(|a, b| a.source.cmp(b.source));
    entries
}
