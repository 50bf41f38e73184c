// model.rs — PendingApproval record and its status lifecycle.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// `pending -> approved -> executed` on a clean release, or `pending ->
/// expired` if released past the TTL. There is no path back to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Executed,
    Expired,
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Executed => "executed",
            ApprovalStatus::Expired => "expired",
        };
        write!(f, "{name}")
    }
}

/// A reference to the permission that put a request behind the approval
/// gate — mirrors `aegis_policy::PermissionRef` without creating a
/// dependency cycle between the two crates.
#[derive(Debug, Clone)]
pub struct PermissionRef {
    pub tool: String,
    pub action: String,
}

/// A deferred dispatch awaiting an explicit release.
#[derive(Debug, Clone)]
pub struct PendingApproval {
    pub id: Uuid,
    pub agent_id: String,
    pub parent_agent: Option<String>,
    pub tool: String,
    pub action: String,
    pub params: Value,
    pub permission_ref: PermissionRef,
    pub status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
}

/// The captured request, returned by a successful `release` so the caller
/// can invoke the tool adapter without re-reading the store.
#[derive(Debug, Clone)]
pub struct ReleasedRequest {
    pub agent_id: String,
    pub parent_agent: Option<String>,
    pub tool: String,
    pub action: String,
    pub params: Value,
}

impl From<&PendingApproval> for ReleasedRequest {
    fn from(approval: &PendingApproval) -> Self {
        Self {
            agent_id: approval.agent_id.clone(),
            parent_agent: approval.parent_agent.clone(),
            tool: approval.tool.clone(),
            action: approval.action.clone(),
            params: approval.params.clone(),
        }
    }
}
