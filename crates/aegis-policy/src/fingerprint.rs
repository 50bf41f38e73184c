// fingerprint.rs — Stable content hash for a PolicySet (§3 invariant 3).
//
// The fingerprint depends only on semantic content: sorted agent ids, and
// within each agent a canonical rendering of its rules. Whitespace, file
// ordering, and mtime never affect it — only the merged, normalized result
// does.

use sha2::{Digest, Sha256};

use crate::model::{AgentRule, Condition, Permission, PolicySet};

pub fn compute(set: &PolicySet) -> String {
    let mut ids: Vec<&String> = set.agents.keys().collect();
    ids.sort();

    let mut canonical = String::new();
    for id in ids {
        let rule = &set.agents[id];
        canonical.push_str(&render_agent(rule));
        canonical.push('\n');
    }

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn render_agent(rule: &AgentRule) -> String {
    let mut out = format!("agent:{}", rule.id);

    let mut allow_only = rule.allow_only_parents.clone().unwrap_or_default();
    allow_only.sort();
    out.push_str(&format!("|allow_only_parents:{}", allow_only.join(",")));

    let mut deny_if = rule.deny_if_parent.clone();
    deny_if.sort();
    out.push_str(&format!("|deny_if_parent:{}", deny_if.join(",")));

    for perm in &rule.permissions {
        out.push_str(&format!("|perm:{}", render_permission(perm)));
    }
    out
}

fn render_permission(perm: &Permission) -> String {
    let mut out = format!(
        "tool={},actions={},require_approval={}",
        perm.tool,
        perm.actions.join(","),
        perm.require_approval
    );
    for cond in perm.conditions_in_order() {
        out.push_str(&format!(",cond={}", render_condition(cond)));
    }
    out
}

fn render_condition(cond: &Condition) -> String {
    match cond {
        Condition::MaxAmount(n) => format!("max_amount:{n}"),
        Condition::Currencies(set) => {
            let mut sorted = set.clone();
            sorted.sort();
            format!("currencies:{}", sorted.join(","))
        }
        Condition::FolderPrefix(p) => format!("folder_prefix:{p}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_dir;
    use std::fs;
    use tempfile::tempdir;

    fn build_set(yaml: &str) -> PolicySet {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("main.yaml"), yaml).unwrap();
        let (files, _) = load_dir(dir.path()).unwrap();
        crate::index::merge(files)
    }

    #[test]
    fn same_content_same_fingerprint() {
        let yaml = "version: 1\nagents:\n  - id: a\n    permissions:\n      - tool: fs\n        actions: [read]\n";
        let set1 = build_set(yaml);
        let set2 = build_set(yaml);
        assert_eq!(compute(&set1), compute(&set2));
    }

    #[test]
    fn whitespace_does_not_affect_fingerprint() {
        let set1 = build_set("version: 1\nagents:\n  - id: a\n    permissions:\n      - tool: fs\n        actions: [read]\n");
        let set2 = build_set("version: 1\n\n\nagents:\n  - id: a\n    permissions:\n      - tool: fs\n        actions: [read]\n\n");
        assert_eq!(compute(&set1), compute(&set2));
    }

    #[test]
    fn different_content_different_fingerprint() {
        let set1 = build_set("version: 1\nagents:\n  - id: a\n    permissions:\n      - tool: fs\n        actions: [read]\n");
        let set2 = build_set("version: 1\nagents:\n  - id: a\n    permissions:\n      - tool: fs\n        actions: [write]\n");
        assert_ne!(compute(&set1), compute(&set2));
    }
}
