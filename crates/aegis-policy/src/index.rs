// index.rs — Policy Index (Module B).
//
// Holds an immutable PolicySet behind a lock-free atomic reference so that
// every request's `current()` read is a simple pointer load — no lock is
// ever taken on the hot path (spec §5). The only writer is the Watcher,
// calling `swap` after a successful reload.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::fingerprint;
use crate::model::{AgentRule, PolicyFile, PolicySet, PolicySource};

/// Merge a set of loaded policy files into one published `PolicySet`.
///
/// Merge rule (spec §4.2): when two files define the same agent id, the
/// later one — by lexical sort of `source_path`, which `loader::load_dir`
/// already guarantees — wins wholesale. `files` must already be in that
/// sorted order.
pub fn merge(files: Vec<PolicyFile>) -> PolicySet {
    let mut agents: std::collections::HashMap<String, AgentRule> = std::collections::HashMap::new();
    let mut sources = Vec::with_capacity(files.len());

    for file in &files {
        sources.push(PolicySource {
            path: file.source_path.clone(),
            version: file.version,
            agent_count: file.agents.len(),
        });
    }

    for file in files {
        for agent in file.agents {
            // Later file in the sorted iteration order overwrites wholesale.
            agents.insert(agent.id.clone(), agent);
        }
    }

    let mut set = PolicySet {
        agents,
        version_fingerprint: String::new(),
        sources,
    };
    set.version_fingerprint = fingerprint::compute(&set);
    set
}

/// Single-writer, many-reader holder for the currently published snapshot.
pub struct PolicyIndex {
    current: ArcSwap<PolicySet>,
}

impl PolicyIndex {
    pub fn new(initial: PolicySet) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Non-blocking read of the current snapshot.
    pub fn current(&self) -> Arc<PolicySet> {
        self.current.load_full()
    }

    /// Publish a new snapshot. Only the Watcher should call this.
    pub fn swap(&self, new: PolicySet) {
        self.current.store(Arc::new(new));
    }
}

impl Default for PolicyIndex {
    fn default() -> Self {
        Self::new(PolicySet::empty())
    }
}
