//! # aegis-policy
//!
//! Policy compilation, index, and evaluation for the Aegis gateway.
//!
//! A [`PolicyIndex`] holds the currently published [`PolicySet`]; the
//! [`loader`] compiles YAML policy files into it; [`evaluate`] is the pure
//! decision function every dispatch runs through. See SPEC_FULL.md for the
//! full module breakdown.

pub mod error;
pub mod evaluator;
pub mod fingerprint;
pub mod index;
pub mod loader;
pub mod model;

pub use error::PolicyError;
pub use evaluator::{evaluate, evaluate_traced, Decision, EvaluationTrace, PermissionRef, Request};
pub use index::{merge, PolicyIndex};
pub use model::{AgentRule, Condition, LoadWarning, Permission, PolicyFile, PolicySet, PolicySource};

use std::path::Path;

/// Load a policy directory and merge it into a fresh `PolicySet` in one call
/// — what the Watcher does on every debounced reload (spec §2 data flow).
pub fn load_and_merge(dir: &Path) -> Result<(PolicySet, Vec<LoadWarning>), PolicyError> {
    let (files, warnings) = loader::load_dir(dir)?;
    Ok((merge(files), warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_and_merge_round_trip() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("main.yaml"),
            "version: 1\nagents:\n  - id: a\n    permissions:\n      - tool: fs\n        actions: [read]\n",
        )
        .unwrap();

        let (set, warnings) = load_and_merge(dir.path()).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(set.agents.len(), 1);
        assert!(!set.version_fingerprint.is_empty());
    }

    #[test]
    fn loading_twice_same_fingerprint() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("main.yaml"),
            "version: 1\nagents:\n  - id: a\n    permissions:\n      - tool: fs\n        actions: [read]\n",
        )
        .unwrap();

        let (set1, _) = load_and_merge(dir.path()).unwrap();
        let (set2, _) = load_and_merge(dir.path()).unwrap();
        assert_eq!(set1.version_fingerprint, set2.version_fingerprint);
    }
}
