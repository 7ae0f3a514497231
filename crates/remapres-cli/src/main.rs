#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]

mod commands;
mod logging;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use remapres_core::ResolverConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "remapres")]
#[command(author, version, about = "Resolve module specifiers with browser field remapping", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    /// Resolver config file (JSON)
    #[arg(long, global = true, value_name = "FILE", env = "REMAPRES_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Resolve one or more specifiers
    Resolve {
        /// Specifiers to resolve
        #[arg(required = true)]
        specifiers: Vec<String>,

        /// Directory to resolve from (defaults to the working directory)
        #[arg(long, value_name = "DIR")]
        from: Option<PathBuf>,

        /// Include the provenance trail
        #[arg(long)]
        provenance: bool,

        /// Extra remap applied on top of manifests (FROM=TO, TO may be `false`)
        #[arg(long = "remap", value_name = "FROM=TO")]
        remaps: Vec<String>,

        /// Log cache statistics when done
        #[arg(long)]
        stats: bool,
    },

    /// Print the flattened remap table for a directory
    Remaps {
        /// Directory whose table to print (defaults to the working directory)
        #[arg(long, value_name = "DIR")]
        from: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Version) {
        return commands::version::run();
    }

    logging::init(cli.verbose, cli.json);

    // Determine working directory
    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let config = match &cli.config {
        Some(path) => ResolverConfig::from_file(&cwd.join(path)).into_diagnostic()?,
        None => ResolverConfig::default(),
    };

    match cli.command {
        Commands::Version => commands::version::run(),
        Commands::Resolve {
            specifiers,
            from,
            provenance,
            remaps,
            stats,
        } => {
            let from = commands::base_dir(&cwd, from.as_deref())?;
            let remaps = commands::resolve::parse_remaps(&cwd, &remaps)?;
            let options = commands::resolve::ResolveArgs {
                from,
                specifiers,
                provenance,
                remaps,
                stats,
            };
            let code = commands::resolve::run(config, &options, cli.json)?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Commands::Remaps { from } => {
            let from = commands::base_dir(&cwd, from.as_deref())?;
            commands::remaps::run(config, &from, cli.json)
        }
    }
}
