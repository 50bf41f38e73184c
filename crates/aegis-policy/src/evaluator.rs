// evaluator.rs — Policy Evaluator (Module D).
//
// Pure function over a PolicySet snapshot: evaluate(snapshot, req) ->
// Decision. No I/O, no locking, fully deterministic (spec §4.4, P1/P2).
// `evaluate_traced` is an additive observability wrapper (SPEC_FULL.md §1)
// that never changes the decision itself.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Condition, PolicySet};

/// A request to perform an action, submitted for evaluation.
#[derive(Debug, Clone)]
pub struct Request {
    pub agent_id: String,
    pub parent_agent: Option<String>,
    pub tool: String,
    pub action: String,
    pub params: Value,
}

/// A reference to the permission that produced an Allow/ApprovalRequired
/// decision — the (tool, first matching action) pair, for telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionRef {
    pub tool: String,
    pub action: String,
}

/// The result of evaluating a request against a policy snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny { reason: String },
    ApprovalRequired { permission_ref: PermissionRef },
}

impl Decision {
    /// The string used in telemetry / admin output (spec §6 decision record).
    pub fn kind(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny { .. } => "deny",
            Decision::ApprovalRequired { .. } => "approval_required",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Decision::Deny { reason } => Some(reason),
            _ => None,
        }
    }
}

/// A single step in the evaluation trace (SPEC_FULL.md §1 observability).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationStep {
    pub check: String,
    pub outcome: String,
    pub terminal: bool,
}

/// Full evaluation trace returned alongside a Decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationTrace {
    pub decision: Decision,
    pub steps: Vec<EvaluationStep>,
}

/// Evaluate a request against a policy snapshot (spec §4.4, steps 1-6).
pub fn evaluate(snapshot: &PolicySet, req: &Request) -> Decision {
    evaluate_traced(snapshot, req).decision
}

/// Same algorithm as `evaluate`, but records every step it took.
pub fn evaluate_traced(snapshot: &PolicySet, req: &Request) -> EvaluationTrace {
    let mut steps = Vec::new();

    // Step 1: agent lookup.
    let rule = match snapshot.get(&req.agent_id) {
        Some(r) => r,
        None => {
            steps.push(EvaluationStep {
                check: "agent_lookup".to_string(),
                outcome: format!("failed: unknown agent '{}'", req.agent_id),
                terminal: true,
            });
            return EvaluationTrace {
                decision: Decision::Deny {
                    reason: "unknown agent".to_string(),
                },
                steps,
            };
        }
    };
    steps.push(EvaluationStep {
        check: "agent_lookup".to_string(),
        outcome: "found".to_string(),
        terminal: false,
    });

    // Step 2: parent checks.
    if let Some(allowed) = &rule.allow_only_parents {
        match &req.parent_agent {
            None => {
                steps.push(EvaluationStep {
                    check: "allow_only_parents".to_string(),
                    outcome: "failed: no parent supplied".to_string(),
                    terminal: true,
                });
                return EvaluationTrace {
                    decision: Decision::Deny {
                        reason: "parent required".to_string(),
                    },
                    steps,
                };
            }
            Some(parent) if !allowed.contains(parent) => {
                steps.push(EvaluationStep {
                    check: "allow_only_parents".to_string(),
                    outcome: format!("failed: parent '{parent}' not permitted"),
                    terminal: true,
                });
                return EvaluationTrace {
                    decision: Decision::Deny {
                        reason: "parent not permitted".to_string(),
                    },
                    steps,
                };
            }
            Some(_) => {
                steps.push(EvaluationStep {
                    check: "allow_only_parents".to_string(),
                    outcome: "passed".to_string(),
                    terminal: false,
                });
            }
        }
    }

    if let Some(parent) = &req.parent_agent {
        if rule.deny_if_parent.contains(parent) {
            steps.push(EvaluationStep {
                check: "deny_if_parent".to_string(),
                outcome: format!("failed: parent '{parent}' denied"),
                terminal: true,
            });
            return EvaluationTrace {
                decision: Decision::Deny {
                    reason: "parent denied".to_string(),
                },
                steps,
            };
        }
    }
    steps.push(EvaluationStep {
        check: "deny_if_parent".to_string(),
        outcome: "passed".to_string(),
        terminal: false,
    });

    // Step 3: first matching permission in declared order.
    let permission = rule
        .permissions
        .iter()
        .find(|p| p.tool == req.tool && p.actions.contains(&req.action));
    let permission = match permission {
        Some(p) => p,
        None => {
            steps.push(EvaluationStep {
                check: "permission_scan".to_string(),
                outcome: format!("failed: no permission for {}.{}", req.tool, req.action),
                terminal: true,
            });
            return EvaluationTrace {
                decision: Decision::Deny {
                    reason: "action not permitted".to_string(),
                },
                steps,
            };
        }
    };
    steps.push(EvaluationStep {
        check: "permission_scan".to_string(),
        outcome: format!("matched {}.{}", req.tool, req.action),
        terminal: false,
    });

    // Step 4: condition checks, in canonical order.
    for condition in permission.conditions_in_order() {
        if let Err(reason) = check_condition(condition, &req.params) {
            steps.push(EvaluationStep {
                check: "condition".to_string(),
                outcome: format!("failed: {reason}"),
                terminal: true,
            });
            return EvaluationTrace {
                decision: Decision::Deny { reason },
                steps,
            };
        }
    }
    steps.push(EvaluationStep {
        check: "conditions".to_string(),
        outcome: "passed".to_string(),
        terminal: false,
    });

    // Step 5/6: approval gate or allow.
    let permission_ref = PermissionRef {
        tool: req.tool.clone(),
        action: req.action.clone(),
    };
    if permission.require_approval {
        steps.push(EvaluationStep {
            check: "approval_gate".to_string(),
            outcome: "requires approval".to_string(),
            terminal: true,
        });
        EvaluationTrace {
            decision: Decision::ApprovalRequired { permission_ref },
            steps,
        }
    } else {
        steps.push(EvaluationStep {
            check: "approval_gate".to_string(),
            outcome: "allowed".to_string(),
            terminal: true,
        });
        EvaluationTrace {
            decision: Decision::Allow,
            steps,
        }
    }
}

fn check_condition(condition: &Condition, params: &Value) -> Result<(), String> {
    match condition {
        Condition::MaxAmount(max) => {
            let amount = params
                .get("amount")
                .and_then(Value::as_f64)
                .ok_or_else(|| "amount required".to_string())?;
            if amount > *max {
                return Err("amount exceeds limit".to_string());
            }
            Ok(())
        }
        Condition::Currencies(allowed) => {
            let currency = params
                .get("currency")
                .and_then(Value::as_str)
                .ok_or_else(|| "currency required".to_string())?;
            if !allowed.iter().any(|c| c == currency) {
                return Err("currency not allowed".to_string());
            }
            Ok(())
        }
        Condition::FolderPrefix(prefix) => {
            let path = params
                .get("path")
                .and_then(Value::as_str)
                .ok_or_else(|| "path outside allowed folder".to_string())?;
            if !path.starts_with(prefix.as_str()) {
                return Err("path outside allowed folder".to_string());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::merge;
    use crate::model::{AgentRule, PolicyFile, Permission};
    use serde_json::json;

    fn agent(id: &str, permissions: Vec<Permission>) -> AgentRule {
        AgentRule {
            id: id.to_string(),
            allow_only_parents: None,
            deny_if_parent: vec![],
            permissions,
        }
    }

    fn set_with(agents: Vec<AgentRule>) -> PolicySet {
        merge(vec![PolicyFile {
            version: 1,
            agents,
            source_path: "main.yaml".to_string(),
        }])
    }

    fn req(agent_id: &str, tool: &str, action: &str, params: Value) -> Request {
        Request {
            agent_id: agent_id.to_string(),
            parent_agent: None,
            tool: tool.to_string(),
            action: action.to_string(),
            params,
        }
    }

    #[test]
    fn unknown_agent_is_denied() {
        let set = PolicySet::empty();
        let decision = evaluate(&set, &req("ghost", "payments", "create", json!({})));
        assert_eq!(
            decision,
            Decision::Deny {
                reason: "unknown agent".to_string()
            }
        );
    }

    #[test]
    fn amount_over_limit_is_denied() {
        let set = set_with(vec![agent(
            "finance-agent",
            vec![Permission {
                tool: "payments".to_string(),
                actions: vec!["create".to_string()],
                conditions: vec![Condition::MaxAmount(5000.0)],
                require_approval: false,
            }],
        )]);
        let decision = evaluate(
            &set,
            &req(
                "finance-agent",
                "payments",
                "create",
                json!({"amount": 50000, "currency": "USD", "vendor_id": "V99"}),
            ),
        );
        assert_eq!(
            decision,
            Decision::Deny {
                reason: "amount exceeds limit".to_string()
            }
        );
    }

    #[test]
    fn amount_within_limit_is_allowed() {
        let set = set_with(vec![agent(
            "finance-agent",
            vec![Permission {
                tool: "payments".to_string(),
                actions: vec!["create".to_string()],
                conditions: vec![Condition::MaxAmount(5000.0)],
                require_approval: false,
            }],
        )]);
        let decision = evaluate(
            &set,
            &req(
                "finance-agent",
                "payments",
                "create",
                json!({"amount": 2000, "currency": "USD", "vendor_id": "V42"}),
            ),
        );
        assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn folder_prefix_scopes_path_access() {
        let set = set_with(vec![agent(
            "hr-agent",
            vec![Permission {
                tool: "files".to_string(),
                actions: vec!["read".to_string()],
                conditions: vec![Condition::FolderPrefix("/hr-docs/".to_string())],
                require_approval: false,
            }],
        )]);
        assert_eq!(
            evaluate(
                &set,
                &req(
                    "hr-agent",
                    "files",
                    "read",
                    json!({"path": "/hr-docs/employee-handbook.txt"})
                )
            ),
            Decision::Allow
        );
        assert_eq!(
            evaluate(
                &set,
                &req("hr-agent", "files", "read", json!({"path": "/legal/contract.docx"}))
            ),
            Decision::Deny {
                reason: "path outside allowed folder".to_string()
            }
        );
    }

    #[test]
    fn allow_only_parents_requires_a_listed_parent() {
        let set = set_with(vec![AgentRule {
            id: "worker-agent".to_string(),
            allow_only_parents: Some(vec!["orchestrator-agent".to_string()]),
            deny_if_parent: vec![],
            permissions: vec![Permission {
                tool: "payments".to_string(),
                actions: vec!["create".to_string()],
                conditions: vec![],
                require_approval: false,
            }],
        }]);

        let mut request = req("worker-agent", "payments", "create", json!({}));
        assert_eq!(
            evaluate(&set, &request),
            Decision::Deny {
                reason: "parent required".to_string()
            }
        );

        request.parent_agent = Some("orchestrator-agent".to_string());
        assert_eq!(evaluate(&set, &request), Decision::Allow);

        request.parent_agent = Some("other".to_string());
        assert_eq!(
            evaluate(&set, &request),
            Decision::Deny {
                reason: "parent not permitted".to_string()
            }
        );
    }

    #[test]
    fn deny_if_parent_overrides_an_otherwise_allowed_request() {
        let set = set_with(vec![AgentRule {
            id: "agent".to_string(),
            allow_only_parents: None,
            deny_if_parent: vec!["blocked-parent".to_string()],
            permissions: vec![Permission {
                tool: "fs".to_string(),
                actions: vec!["read".to_string()],
                conditions: vec![],
                require_approval: false,
            }],
        }]);

        let mut request = req("agent", "fs", "read", json!({}));
        request.parent_agent = Some("blocked-parent".to_string());
        assert_eq!(
            evaluate(&set, &request),
            Decision::Deny {
                reason: "parent denied".to_string()
            }
        );
    }

    #[test]
    fn require_approval_yields_approval_required_not_allow() {
        let set = set_with(vec![agent(
            "refund-agent",
            vec![Permission {
                tool: "payments".to_string(),
                actions: vec!["refund".to_string()],
                conditions: vec![],
                require_approval: true,
            }],
        )]);
        let decision = evaluate(&set, &req("refund-agent", "payments", "refund", json!({})));
        match decision {
            Decision::ApprovalRequired { permission_ref } => {
                assert_eq!(permission_ref.tool, "payments");
                assert_eq!(permission_ref.action, "refund");
            }
            other => panic!("expected ApprovalRequired, got {other:?}"),
        }
    }

    #[test]
    fn unmatched_action_is_denied() {
        let set = set_with(vec![agent(
            "agent",
            vec![Permission {
                tool: "fs".to_string(),
                actions: vec!["read".to_string()],
                conditions: vec![],
                require_approval: false,
            }],
        )]);
        assert_eq!(
            evaluate(&set, &req("agent", "fs", "write", json!({}))),
            Decision::Deny {
                reason: "action not permitted".to_string()
            }
        );
    }

    #[test]
    fn first_matching_permission_wins() {
        let set = set_with(vec![agent(
            "agent",
            vec![
                Permission {
                    tool: "fs".to_string(),
                    actions: vec!["read".to_string()],
                    conditions: vec![Condition::FolderPrefix("/a/".to_string())],
                    require_approval: false,
                },
                Permission {
                    tool: "fs".to_string(),
                    actions: vec!["read".to_string()],
                    conditions: vec![],
                    require_approval: false,
                },
            ],
        )]);
        // The first permission applies even though the second would allow it.
        assert_eq!(
            evaluate(&set, &req("agent", "fs", "read", json!({"path": "/b/file.txt"}))),
            Decision::Deny {
                reason: "path outside allowed folder".to_string()
            }
        );
    }

    #[test]
    fn evaluation_is_deterministic() {
        let set = set_with(vec![agent(
            "agent",
            vec![Permission {
                tool: "fs".to_string(),
                actions: vec!["read".to_string()],
                conditions: vec![],
                require_approval: false,
            }],
        )]);
        let request = req("agent", "fs", "read", json!({}));
        let first = evaluate(&set, &request);
        let second = evaluate(&set, &request);
        assert_eq!(first, second);
    }

    #[test]
    fn trace_records_terminal_step() {
        let set = PolicySet::empty();
        let trace = evaluate_traced(&set, &req("ghost", "fs", "read", json!({})));
        assert!(trace.steps.last().unwrap().terminal);
        assert_eq!(trace.decision, Decision::Deny { reason: "unknown agent".to_string() });
    }
}
