// orchestrator.rs — DispatchOrchestrator: the one component that ties
// policy, approvals, audit, and the tool adapter together (Module G).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use aegis_adapter::ToolAdapter;
use aegis_approval::{ApprovalError, ApprovalStore, PermissionRef as ApprovalPermissionRef};
use aegis_audit::{canonicalize_params, DecisionRecord, DecisionRing, Telemetry};
use aegis_policy::{evaluate_traced, Decision, PolicyIndex, Request};

/// The terminal outcome of a `dispatch` or `release` call, handed back to
/// the HTTP layer for status-code mapping.
#[derive(Debug)]
pub enum DispatchOutcome {
    Allowed { result: Value },
    Denied { reason: String },
    ApprovalRequired { approval_id: Uuid },
    AdapterFailed { error: String },
    AdapterTimeout,
    ApprovalNotFound,
    ApprovalConflict { current_status: String },
    ApprovalExpired,
}

pub struct DispatchOrchestrator {
    index: Arc<PolicyIndex>,
    approvals: Arc<ApprovalStore>,
    ring: Arc<DecisionRing>,
    telemetry: Arc<dyn Telemetry>,
    adapter: Arc<dyn ToolAdapter>,
}

impl DispatchOrchestrator {
    pub fn new(
        index: Arc<PolicyIndex>,
        approvals: Arc<ApprovalStore>,
        ring: Arc<DecisionRing>,
        telemetry: Arc<dyn Telemetry>,
        adapter: Arc<dyn ToolAdapter>,
    ) -> Self {
        Self {
            index,
            approvals,
            ring,
            telemetry,
            adapter,
        }
    }

    pub async fn dispatch(&self, req: Request, deadline: Duration) -> DispatchOutcome {
        let snapshot = self.index.current();
        let fingerprint = snapshot.version_fingerprint.clone();
        let params_hash = canonicalize_params(&req.params);
        let trace_id = Uuid::new_v4();

        let trace = evaluate_traced(&snapshot, &req);
        tracing::debug!(
            agent_id = %req.agent_id,
            tool = %req.tool,
            action = %req.action,
            steps = ?trace.steps,
            "evaluation trace"
        );
        let decision = trace.decision;

        match decision {
            Decision::Deny { reason } => {
                self.record(&req, "deny", Some(reason.clone()), None, trace_id, &fingerprint, &params_hash);
                DispatchOutcome::Denied { reason }
            }
            Decision::ApprovalRequired { permission_ref } => {
                let approval_id = self.approvals.create(
                    req.agent_id.clone(),
                    req.parent_agent.clone(),
                    req.tool.clone(),
                    req.action.clone(),
                    req.params.clone(),
                    ApprovalPermissionRef {
                        tool: permission_ref.tool,
                        action: permission_ref.action,
                    },
                );
                self.record(
                    &req,
                    "approval_required",
                    None,
                    None,
                    trace_id,
                    &fingerprint,
                    &params_hash,
                );
                DispatchOutcome::ApprovalRequired { approval_id }
            }
            Decision::Allow => {
                let started = std::time::Instant::now();
                let outcome = tokio::time::timeout(
                    deadline,
                    self.adapter.invoke(&req.tool, &req.action, &req.params),
                )
                .await;
                let latency_ms = started.elapsed().as_millis() as u64;

                match outcome {
                    Ok(Ok(result)) => {
                        self.record(&req, "allow", None, Some(latency_ms), trace_id, &fingerprint, &params_hash);
                        DispatchOutcome::Allowed { result }
                    }
                    Ok(Err(e)) => {
                        self.record(
                            &req,
                            "allow",
                            Some(e.to_string()),
                            Some(latency_ms),
                            trace_id,
                            &fingerprint,
                            &params_hash,
                        );
                        DispatchOutcome::AdapterFailed { error: e.to_string() }
                    }
                    Err(_) => {
                        self.record(
                            &req,
                            "allow",
                            Some("adapter timeout".to_string()),
                            Some(latency_ms),
                            trace_id,
                            &fingerprint,
                            &params_hash,
                        );
                        DispatchOutcome::AdapterTimeout
                    }
                }
            }
        }
    }

    /// Releases a pending approval and, on success, invokes the adapter
    /// without re-evaluating policy (spec §9(iii)).
    pub async fn release(&self, id: Uuid, approver_id: &str, deadline: Duration) -> DispatchOutcome {
        let released = match self.approvals.release(id, approver_id) {
            Ok(released) => released,
            Err(ApprovalError::NotFound(_)) => return DispatchOutcome::ApprovalNotFound,
            Err(ApprovalError::Conflict { current_status, .. }) => {
                return DispatchOutcome::ApprovalConflict { current_status }
            }
            Err(ApprovalError::Expired(_)) => return DispatchOutcome::ApprovalExpired,
        };

        let trace_id = Uuid::new_v4();
        let fingerprint = self.index.current().version_fingerprint.clone();
        let params_hash = canonicalize_params(&released.params);
        let started = std::time::Instant::now();

        let outcome = tokio::time::timeout(
            deadline,
            self.adapter.invoke(&released.tool, &released.action, &released.params),
        )
        .await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let req = Request {
            agent_id: released.agent_id.clone(),
            parent_agent: released.parent_agent.clone(),
            tool: released.tool.clone(),
            action: released.action.clone(),
            params: released.params.clone(),
        };

        match outcome {
            Ok(Ok(result)) => {
                self.record(
                    &req,
                    "approved_executed",
                    None,
                    Some(latency_ms),
                    trace_id,
                    &fingerprint,
                    &params_hash,
                );
                DispatchOutcome::Allowed { result }
            }
            Ok(Err(e)) => {
                self.record(
                    &req,
                    "approved_executed",
                    Some(e.to_string()),
                    Some(latency_ms),
                    trace_id,
                    &fingerprint,
                    &params_hash,
                );
                DispatchOutcome::AdapterFailed { error: e.to_string() }
            }
            Err(_) => {
                self.record(
                    &req,
                    "approved_executed",
                    Some("adapter timeout".to_string()),
                    Some(latency_ms),
                    trace_id,
                    &fingerprint,
                    &params_hash,
                );
                DispatchOutcome::AdapterTimeout
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &self,
        req: &Request,
        decision: &str,
        reason: Option<String>,
        latency_ms: Option<u64>,
        trace_id: Uuid,
        policy_fingerprint: &str,
        params_hash: &str,
    ) {
        let record = DecisionRecord {
            timestamp: Utc::now(),
            agent_id: req.agent_id.clone(),
            parent_agent: req.parent_agent.clone(),
            tool: req.tool.clone(),
            action: req.action.clone(),
            decision: decision.to_string(),
            reason,
            params_hash: params_hash.to_string(),
            latency_ms,
            trace_id,
            policy_fingerprint: policy_fingerprint.to_string(),
        };
        self.ring.append(record.clone());
        self.telemetry.emit(&record);
    }
}
