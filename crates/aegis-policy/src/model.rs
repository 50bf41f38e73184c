// model.rs — Policy data model.
//
// Mirrors §3 of the spec: a PolicyFile compiles down to a list of AgentRule,
// AgentRules merge into a PolicySet keyed by agent_id. Condition maps arrive
// from YAML as loose key/value pairs but are closed into a `Condition` sum
// at load time (see loader.rs) — this module only holds the already-closed
// shape.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single recognized condition on a matched permission.
///
/// Closed at load time so evaluation never has to guess at a condition's
/// type — unrecognized YAML keys are dropped (with a warning) before a
/// `Condition` is ever constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// Upper bound (inclusive) on `params.amount`.
    MaxAmount(f64),
    /// `params.currency` must be a member of this set.
    Currencies(Vec<String>),
    /// `params.path` must begin with this prefix.
    FolderPrefix(String),
}

impl Condition {
    /// The canonical evaluation order used by the evaluator (spec §4.4):
    /// `max_amount`, then `currencies`, then `folder_prefix`.
    pub fn rank(&self) -> u8 {
        match self {
            Condition::MaxAmount(_) => 0,
            Condition::Currencies(_) => 1,
            Condition::FolderPrefix(_) => 2,
        }
    }
}

/// A permission grant within an agent rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub tool: String,
    pub actions: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub require_approval: bool,
}

impl Permission {
    /// Conditions in the fixed canonical evaluation order (spec §4.4).
    pub fn conditions_in_order(&self) -> Vec<&Condition> {
        let mut ordered: Vec<&Condition> = self.conditions.iter().collect();
        ordered.sort_by_key(|c| c.rank());
        ordered
    }
}

/// One agent's rule: parent constraints plus an ordered list of permissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRule {
    pub id: String,
    #[serde(default)]
    pub allow_only_parents: Option<Vec<String>>,
    #[serde(default)]
    pub deny_if_parent: Vec<String>,
    pub permissions: Vec<Permission>,
}

/// One parsed, normalized policy file (§3 PolicyFile).
#[derive(Debug, Clone)]
pub struct PolicyFile {
    pub version: u32,
    pub agents: Vec<AgentRule>,
    pub source_path: String,
}

/// A warning surfaced during load — the file is dropped, not the whole load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadWarning {
    pub source_path: String,
    pub reason: String,
}

/// Provenance entry for admin introspection (§3, §6 `/api/admin/policies`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicySource {
    pub path: String,
    pub version: u32,
    pub agent_count: usize,
}

/// An immutable, published snapshot of all active rules.
#[derive(Debug, Clone, Default)]
pub struct PolicySet {
    pub agents: HashMap<String, AgentRule>,
    pub version_fingerprint: String,
    pub sources: Vec<PolicySource>,
}

impl PolicySet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, agent_id: &str) -> Option<&AgentRule> {
        self.agents.get(agent_id)
    }
}
