//! Module resolver with platform remapping.
//!
//! Raw resolution follows Node's rules for relative, absolute and bare
//! specifiers. The raw result is then threaded through the remap table of the
//! starting directory (plus any caller overrides) until it settles.

mod cache;
mod engine;
mod remap;
pub mod trace;

pub use cache::{CacheCounters, CacheStats};
pub use engine::{Resolution, ResolveOptions, ResolveOutput, Resolver, ResolverBuilder};
pub use remap::{RemapTable, RemapTarget};
pub use trace::{Provenance, ProvenanceStep, PROVENANCE_SCHEMA_VERSION};
