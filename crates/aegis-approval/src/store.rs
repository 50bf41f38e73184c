// store.rs — ApprovalStore: the pending-approval map and its atomic release.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApprovalError;
use crate::model::{ApprovalStatus, PendingApproval, PermissionRef, ReleasedRequest};

/// Default approval TTL: 15 minutes (spec §3).
pub const DEFAULT_TTL_SECONDS: i64 = 900;

/// Holds pending approvals behind a single mutex. Release is a single
/// critical section — the store never invokes the tool adapter itself, it
/// only hands back the captured request for the caller to dispatch.
pub struct ApprovalStore {
    entries: Mutex<HashMap<Uuid, PendingApproval>>,
    ttl: Duration,
}

impl ApprovalStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        agent_id: impl Into<String>,
        parent_agent: Option<String>,
        tool: impl Into<String>,
        action: impl Into<String>,
        params: Value,
        permission_ref: PermissionRef,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let approval = PendingApproval {
            id,
            agent_id: agent_id.into(),
            parent_agent,
            tool: tool.into(),
            action: action.into(),
            params,
            permission_ref,
            status: ApprovalStatus::Pending,
            created_at: Utc::now(),
        };
        self.entries.lock().unwrap().insert(id, approval);
        id
    }

    /// Atomic pending -> approved -> executed transition. `approver_id` is
    /// recorded in the log line but the store does not authorize it — that
    /// is the caller's concern.
    pub fn release(&self, id: Uuid, approver_id: &str) -> Result<ReleasedRequest, ApprovalError> {
        let mut guard = self.entries.lock().unwrap();
        let approval = guard.get_mut(&id).ok_or(ApprovalError::NotFound(id))?;

        if approval.status != ApprovalStatus::Pending {
            return Err(ApprovalError::Conflict {
                id,
                current_status: approval.status.to_string(),
            });
        }

        if Utc::now() - approval.created_at > self.ttl {
            approval.status = ApprovalStatus::Expired;
            return Err(ApprovalError::Expired(id));
        }

        approval.status = ApprovalStatus::Approved;
        approval.status = ApprovalStatus::Executed;
        let released = ReleasedRequest::from(&*approval);
        tracing::info!(approval_id = %id, approver_id, "approval released");
        Ok(released)
    }

    pub fn list_pending(&self) -> Vec<PendingApproval> {
        self.entries
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.status == ApprovalStatus::Pending)
            .cloned()
            .collect()
    }

    /// Marks entries past TTL as `expired`. Called on a timer by
    /// `aegis-daemon`; exposed as a plain method so tests can drive it
    /// synchronously.
    pub fn sweep_expired(&self) -> usize {
        let mut guard = self.entries.lock().unwrap();
        let now = Utc::now();
        let mut swept = 0;
        for approval in guard.values_mut() {
            if approval.status == ApprovalStatus::Pending && now - approval.created_at > self.ttl {
                approval.status = ApprovalStatus::Expired;
                swept += 1;
            }
        }
        swept
    }

    pub fn get(&self, id: Uuid) -> Option<PendingApproval> {
        self.entries.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ApprovalStore {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECONDS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_permission_ref() -> PermissionRef {
        PermissionRef {
            tool: "payments".to_string(),
            action: "refund".to_string(),
        }
    }

    #[test]
    fn create_then_release_yields_ready() {
        let store = ApprovalStore::default();
        let id = store.create(
            "refund-agent",
            None,
            "payments",
            "refund",
            json!({"amount": 100}),
            sample_permission_ref(),
        );

        let released = store.release(id, "ops-lead").unwrap();
        assert_eq!(released.tool, "payments");
        assert_eq!(released.action, "refund");
        assert_eq!(store.get(id).unwrap().status, ApprovalStatus::Executed);
    }

    #[test]
    fn second_release_of_same_id_is_conflict() {
        let store = ApprovalStore::default();
        let id = store.create(
            "refund-agent",
            None,
            "payments",
            "refund",
            json!({}),
            sample_permission_ref(),
        );

        store.release(id, "ops-lead").unwrap();
        let second = store.release(id, "ops-lead");
        assert!(matches!(second, Err(ApprovalError::Conflict { .. })));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let store = ApprovalStore::default();
        let result = store.release(Uuid::new_v4(), "ops-lead");
        assert!(matches!(result, Err(ApprovalError::NotFound(_))));
    }

    #[test]
    fn release_past_ttl_is_expired() {
        let store = ApprovalStore::new(Duration::milliseconds(10));
        let id = store.create(
            "refund-agent",
            None,
            "payments",
            "refund",
            json!({}),
            sample_permission_ref(),
        );

        std::thread::sleep(std::time::Duration::from_millis(50));
        let result = store.release(id, "ops-lead");
        assert!(matches!(result, Err(ApprovalError::Expired(_))));
        assert_eq!(store.get(id).unwrap().status, ApprovalStatus::Expired);
    }

    #[test]
    fn sweep_expired_marks_stale_pending_entries() {
        let store = ApprovalStore::new(Duration::milliseconds(10));
        let id = store.create(
            "refund-agent",
            None,
            "payments",
            "refund",
            json!({}),
            sample_permission_ref(),
        );

        std::thread::sleep(std::time::Duration::from_millis(50));
        assert_eq!(store.sweep_expired(), 1);
        assert_eq!(store.get(id).unwrap().status, ApprovalStatus::Expired);
        // Already swept, a second pass finds nothing left pending.
        assert_eq!(store.sweep_expired(), 0);
    }

    #[test]
    fn list_pending_excludes_terminal_entries() {
        let store = ApprovalStore::default();
        let pending_id = store.create(
            "a",
            None,
            "payments",
            "refund",
            json!({}),
            sample_permission_ref(),
        );
        let executed_id = store.create(
            "a",
            None,
            "payments",
            "refund",
            json!({}),
            sample_permission_ref(),
        );
        store.release(executed_id, "ops-lead").unwrap();

        let pending = store.list_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, pending_id);
    }

    /// P4: a burst of concurrent releases on the same id yields exactly one
    /// `Ready`, the rest `Conflict`.
    #[test]
    fn concurrent_releases_yield_exactly_one_ready() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(ApprovalStore::default());
        let id = store.create(
            "refund-agent",
            None,
            "payments",
            "refund",
            json!({}),
            sample_permission_ref(),
        );

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.release(id, "ops-lead").is_ok())
            })
            .collect();

        let ready_count = handles.into_iter().filter(|h| h.join().unwrap()).count();
        assert_eq!(ready_count, 1);
    }
}
