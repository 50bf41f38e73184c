// loader.rs — Policy Loader (Module A).
//
// Scans a directory for `*.yml`/`*.yaml` files and compiles each into a
// PolicyFile. A file that fails validation is dropped — it produces a
// LoadWarning, it never aborts the whole load (spec §4.1, §7
// PolicyLoadError). If every file drops, `load` returns the empty set.
//
// Condition maps arrive as loose YAML mappings; recognized keys
// (max_amount, currencies, folder_prefix) are closed into `Condition`
// variants here. Unknown keys are dropped with a warning (forward
// compatibility, spec §3).

use std::path::{Path, PathBuf};

use glob::glob;

use crate::error::PolicyError;
use crate::model::{AgentRule, Condition, LoadWarning, Permission, PolicyFile};

/// Recognized condition keys, in the canonical evaluation order (§4.4).
const KNOWN_CONDITION_KEYS: &[&str] = &["max_amount", "currencies", "folder_prefix"];

/// Scan `dir` for policy files and compile each into a `PolicyFile`.
///
/// Returns every file that parsed and validated, plus warnings for the ones
/// that didn't. Never panics on a malformed file — that file is simply
/// absent from the result.
pub fn load_dir(dir: &Path) -> Result<(Vec<PolicyFile>, Vec<LoadWarning>), PolicyError> {
    std::fs::read_dir(dir).map_err(|source| PolicyError::DirectoryUnreadable {
        path: dir.display().to_string(),
        source,
    })?;

    let pattern_yml = dir.join("*.yml");
    let pattern_yaml = dir.join("*.yaml");

    let mut paths: Vec<PathBuf> = Vec::new();
    for pattern in [pattern_yml, pattern_yaml] {
        let pattern_str = pattern.to_string_lossy().to_string();
        let matches = glob(&pattern_str).map_err(|e| PolicyError::DirectoryUnreadable {
            path: dir.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()),
        })?;
        for entry in matches {
            if let Ok(path) = entry {
                paths.push(path);
            }
        }
    }
    // Deterministic merge order depends on this sort (spec §4.2: "later"
    // means later in lexical sort of source paths).
    paths.sort();

    let mut files = Vec::new();
    let mut warnings = Vec::new();

    for path in paths {
        match load_one(&path) {
            Ok(file) => files.push(file),
            Err(reason) => warnings.push(LoadWarning {
                source_path: path.display().to_string(),
                reason,
            }),
        }
    }

    Ok((files, warnings))
}

/// Parse and validate one policy file. Returns a human-readable reason on
/// any validation failure rather than a typed error — every failure here
/// becomes a `LoadWarning`, never a propagated error (spec §4.1).
fn load_one(path: &Path) -> Result<PolicyFile, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("read failed: {e}"))?;
    let raw: serde_yaml::Value =
        serde_yaml::from_str(&text).map_err(|e| format!("yaml parse failed: {e}"))?;

    let mapping = raw.as_mapping().ok_or("file is not a YAML mapping")?;

    let version = mapping
        .get(serde_yaml::Value::String("version".into()))
        .and_then(|v| v.as_u64())
        .ok_or("missing or non-integer 'version'")?;
    if version != 1 {
        return Err(format!("unrecognized version {version} (expected 1)"));
    }

    let agents_value = mapping
        .get(serde_yaml::Value::String("agents".into()))
        .ok_or("missing 'agents'")?;
    let agents_seq = agents_value.as_sequence().ok_or("'agents' is not a sequence")?;

    let mut agents = Vec::with_capacity(agents_seq.len());
    for (idx, agent_value) in agents_seq.iter().enumerate() {
        let agent = parse_agent(agent_value)
            .map_err(|e| format!("agents[{idx}]: {e}"))?;
        agents.push(agent);
    }

    Ok(PolicyFile {
        version: version as u32,
        agents,
        source_path: path.display().to_string(),
    })
}

fn parse_agent(value: &serde_yaml::Value) -> Result<AgentRule, String> {
    let mapping = value.as_mapping().ok_or("agent is not a mapping")?;

    let id = mapping
        .get(serde_yaml::Value::String("id".into()))
        .and_then(|v| v.as_str())
        .ok_or("missing or non-string 'id'")?
        .trim()
        .to_string();
    if id.is_empty() {
        return Err("'id' is empty".to_string());
    }

    let allow_only_parents = mapping
        .get(serde_yaml::Value::String("allow_only_parents".into()))
        .map(parse_string_set)
        .transpose()?;

    let deny_if_parent = mapping
        .get(serde_yaml::Value::String("deny_if_parent".into()))
        .map(parse_string_set)
        .transpose()?
        .unwrap_or_default();

    // "permissions" and "allow" are both accepted spellings (spec §4.1).
    let permissions_value = mapping
        .get(serde_yaml::Value::String("permissions".into()))
        .or_else(|| mapping.get(serde_yaml::Value::String("allow".into())))
        .ok_or("missing 'permissions' (or 'allow')")?;
    let permissions_seq = permissions_value
        .as_sequence()
        .ok_or("'permissions' is not a sequence")?;

    let mut permissions = Vec::with_capacity(permissions_seq.len());
    for (idx, perm_value) in permissions_seq.iter().enumerate() {
        let perm = parse_permission(perm_value).map_err(|e| format!("permissions[{idx}]: {e}"))?;
        permissions.push(perm);
    }

    Ok(AgentRule {
        id,
        allow_only_parents,
        deny_if_parent,
        permissions,
    })
}

fn parse_permission(value: &serde_yaml::Value) -> Result<Permission, String> {
    let mapping = value.as_mapping().ok_or("permission is not a mapping")?;

    let tool = mapping
        .get(serde_yaml::Value::String("tool".into()))
        .and_then(|v| v.as_str())
        .ok_or("missing or non-string 'tool'")?
        .to_string();

    let actions_value = mapping
        .get(serde_yaml::Value::String("actions".into()))
        .ok_or("missing 'actions'")?;
    let actions_seq = actions_value.as_sequence().ok_or("'actions' is not a sequence")?;
    if actions_seq.is_empty() {
        return Err("'actions' must be non-empty".to_string());
    }
    // Dedupe, preserving first-seen order (spec §4.1 normalization).
    let mut actions = Vec::new();
    for action_value in actions_seq {
        let action = action_value
            .as_str()
            .ok_or("'actions' entries must be strings")?
            .to_string();
        if !actions.contains(&action) {
            actions.push(action);
        }
    }

    let require_approval = mapping
        .get(serde_yaml::Value::String("require_approval".into()))
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let conditions = mapping
        .get(serde_yaml::Value::String("conditions".into()))
        .map(parse_conditions)
        .transpose()?
        .unwrap_or_default();

    Ok(Permission {
        tool,
        actions,
        conditions,
        require_approval,
    })
}

/// Parse the condition map, closing recognized keys into `Condition`
/// variants. Unknown keys are silently dropped — forward compatibility per
/// spec §3 — but logged here by the caller via the returned warnings would
/// require plumbing a second warning channel per permission; instead we log
/// directly, matching the "logged on load" requirement in §3.
fn parse_conditions(value: &serde_yaml::Value) -> Result<Vec<Condition>, String> {
    let mapping = value.as_mapping().ok_or("'conditions' is not a mapping")?;
    let mut conditions = Vec::new();

    for (key, val) in mapping {
        let key_str = key.as_str().unwrap_or("");
        match key_str {
            "max_amount" => {
                let amount = val
                    .as_f64()
                    .ok_or("'max_amount' must be a number")?;
                conditions.push(Condition::MaxAmount(amount));
            }
            "currencies" => {
                let currencies = parse_string_set(val)?;
                conditions.push(Condition::Currencies(currencies));
            }
            "folder_prefix" => {
                let prefix = val.as_str().ok_or("'folder_prefix' must be a string")?;
                conditions.push(Condition::FolderPrefix(prefix.to_string()));
            }
            other if !KNOWN_CONDITION_KEYS.contains(&other) => {
                tracing::warn!(condition_key = other, "ignoring unrecognized condition key");
            }
            _ => {}
        }
    }

    Ok(conditions)
}

fn parse_string_set(value: &serde_yaml::Value) -> Result<Vec<String>, String> {
    let seq = value.as_sequence().ok_or("expected a sequence of strings")?;
    seq.iter()
        .map(|v| {
            v.as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| "expected a string".to_string())
        })
        .collect()
}
