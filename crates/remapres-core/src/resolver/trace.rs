//! Provenance trail for resolution.
//!
//! Records the decisions that led to a result, for diagnostics and for tools
//! that re-resolve from recorded steps. Recording never changes the outcome.

use super::remap::RemapTarget;
use serde::Serialize;
use std::path::PathBuf;

/// Schema version for serialized provenance.
/// Bump when the step structure changes incompatibly.
pub const PROVENANCE_SCHEMA_VERSION: u32 = 1;

/// A single recorded decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProvenanceStep {
    /// A directory's main file was selected.
    Main { dir: PathBuf, main: PathBuf },
    /// A package directory was found in a search path.
    Installed {
        package_name: String,
        search_path: PathBuf,
    },
    /// A remap hop was taken.
    Remap { from: PathBuf, to: RemapTarget },
}

/// Ordered list of provenance steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Provenance {
    steps: Vec<ProvenanceStep>,
}

impl Provenance {
    /// Create a new empty trail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn push(&mut self, step: ProvenanceStep) {
        self.steps.push(step);
    }

    #[must_use]
    pub fn steps(&self) -> &[ProvenanceStep] {
        &self.steps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Remap hops, in the order they were taken.
    pub fn remaps(&self) -> impl Iterator<Item = (&PathBuf, &RemapTarget)> {
        self.steps.iter().filter_map(|step| match step {
            ProvenanceStep::Remap { from, to } => Some((from, to)),
            _ => None,
        })
    }
}

/// Record a step if a trail is being kept.
pub(crate) fn record(trail: &mut Option<Provenance>, step: impl FnOnce() -> ProvenanceStep) {
    if let Some(trail) = trail {
        trail.push(step());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_only_when_enabled() {
        let mut off: Option<Provenance> = None;
        record(&mut off, || ProvenanceStep::Main {
            dir: PathBuf::from("/p"),
            main: PathBuf::from("/p/index.js"),
        });
        assert!(off.is_none());

        let mut on = Some(Provenance::new());
        record(&mut on, || ProvenanceStep::Installed {
            package_name: "x".to_string(),
            search_path: PathBuf::from("/p/node_modules"),
        });
        assert_eq!(on.unwrap().len(), 1);
    }

    #[test]
    fn test_serialized_shape() {
        let mut trail = Provenance::new();
        trail.push(ProvenanceStep::Remap {
            from: PathBuf::from("/p/server.js"),
            to: RemapTarget::Path(PathBuf::from("/p/client.js")),
        });
        trail.push(ProvenanceStep::Remap {
            from: PathBuf::from("/p/client.js"),
            to: RemapTarget::Empty,
        });

        let json = serde_json::to_value(&trail).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"type": "remap", "from": "/p/server.js", "to": "/p/client.js"},
                {"type": "remap", "from": "/p/client.js", "to": false},
            ])
        );
        assert_eq!(trail.remaps().count(), 2);
    }
}
