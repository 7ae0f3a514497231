#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::return_self_not_must_use)]

//! Node-style module resolution with `browser` field remapping.
//!
//! ```no_run
//! use remapres_core::{Resolution, Resolver};
//! use std::path::Path;
//!
//! let resolver = Resolver::new();
//! match resolver.resolve(Path::new("/proj"), "./server")? {
//!     Resolution::Path(path) => println!("{}", path.display()),
//!     Resolution::Empty => println!("(empty module)"),
//!     Resolution::NotFound => println!("not found"),
//! }
//! # Ok::<(), remapres_core::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod fs;
pub mod manifest;
pub mod native;
pub mod paths;
pub mod resolver;
pub mod version;

pub use config::ResolverConfig;
pub use error::Error;
pub use fs::{CachingFileSystem, FileKind, FileSystem, MemoryFileSystem, RealFileSystem};
pub use manifest::{Manifest, RemapDeclaration, RemapValue};
pub use native::{NativeResolver, NoBuiltins, NodeBuiltins};
pub use resolver::{
    CacheStats, Provenance, ProvenanceStep, RemapTable, RemapTarget, Resolution, ResolveOptions,
    ResolveOutput, Resolver, ResolverBuilder,
};
pub use version::VERSION;
