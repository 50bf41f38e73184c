// record.rs — DecisionRecord: what gets appended to the ring and handed to telemetry.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One terminal outcome of a dispatch. `decision` is one of `"allow"`,
/// `"deny"`, `"approval_required"`, `"approved_executed"` (spec §3/§4.7) —
/// kept as a plain string rather than an enum tied to `aegis-policy::Decision`
/// so this crate doesn't need to depend on it for a fourth variant
/// (`approved_executed`) that only exists in the ring, not in `Decision`.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub timestamp: DateTime<Utc>,
    pub agent_id: String,
    pub parent_agent: Option<String>,
    pub tool: String,
    pub action: String,
    pub decision: String,
    pub reason: Option<String>,
    pub params_hash: String,
    pub latency_ms: Option<u64>,
    pub trace_id: Uuid,
    pub policy_fingerprint: String,
}
