// routes.rs — the HTTP surface (spec §6): dispatch, approve, health, admin introspection.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use aegis_audit::canonicalize_params;
use aegis_gateway::DispatchOutcome;
use aegis_policy::Request;

use crate::state::AppState;

const AGENT_ID_HEADER: &str = "x-agent-id";
const PARENT_AGENT_HEADER: &str = "x-parent-agent";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/tools/{tool}/{action}", post(dispatch_handler))
        .route("/api/approve/{approval_id}", post(approve_handler))
        .route("/health", get(health_handler))
        .route("/api/admin/agents", get(admin_agents_handler))
        .route("/api/admin/policies", get(admin_policies_handler))
        .route("/api/admin/decisions", get(admin_decisions_handler))
        .route("/api/admin/approvals/pending", get(admin_pending_approvals_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({"error": message}))).into_response()
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

async fn dispatch_handler(
    Path((tool, action)): Path<(String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(params): Json<Value>,
) -> Response {
    let Some(agent_id) = header_value(&headers, AGENT_ID_HEADER) else {
        return bad_request("missing X-Agent-ID header");
    };
    let parent_agent = header_value(&headers, PARENT_AGENT_HEADER);

    let req = Request {
        agent_id,
        parent_agent,
        tool,
        action,
        params,
    };

    let outcome = state.orchestrator.dispatch(req, state.request_timeout).await;
    outcome_response(outcome)
}

async fn approve_handler(
    Path(approval_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let Some(approver_id) = header_value(&headers, AGENT_ID_HEADER) else {
        return bad_request("missing X-Agent-ID header");
    };
    let Ok(id) = Uuid::parse_str(&approval_id) else {
        return bad_request("approval id is not a valid UUID");
    };

    let outcome = state.orchestrator.release(id, &approver_id, state.request_timeout).await;
    outcome_response(outcome)
}

fn outcome_response(outcome: DispatchOutcome) -> Response {
    match outcome {
        DispatchOutcome::Allowed { result } => (StatusCode::OK, Json(json!({"result": result}))).into_response(),
        DispatchOutcome::Denied { reason } => (StatusCode::FORBIDDEN, Json(json!({"reason": reason}))).into_response(),
        DispatchOutcome::ApprovalRequired { approval_id } => {
            (StatusCode::ACCEPTED, Json(json!({"approval_id": approval_id}))).into_response()
        }
        DispatchOutcome::AdapterFailed { error } => {
            (StatusCode::BAD_GATEWAY, Json(json!({"error": error}))).into_response()
        }
        DispatchOutcome::AdapterTimeout => (
            StatusCode::GATEWAY_TIMEOUT,
            Json(json!({"error": "adapter timeout"})),
        )
            .into_response(),
        DispatchOutcome::ApprovalNotFound => {
            (StatusCode::NOT_FOUND, Json(json!({"error": "approval not found"}))).into_response()
        }
        DispatchOutcome::ApprovalConflict { current_status } => (
            StatusCode::CONFLICT,
            Json(json!({"error": "approval is not pending", "current_status": current_status})),
        )
            .into_response(),
        DispatchOutcome::ApprovalExpired => {
            (StatusCode::CONFLICT, Json(json!({"error": "approval has expired"}))).into_response()
        }
    }
}

async fn health_handler() -> Response {
    (StatusCode::OK, Json(json!({"status": "ok"}))).into_response()
}

async fn admin_agents_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.index.current();
    let agents: Vec<&String> = snapshot.agents.keys().collect();
    (StatusCode::OK, Json(json!({"agents": agents}))).into_response()
}

async fn admin_policies_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.index.current();
    (StatusCode::OK, Json(json!({"policies": snapshot.sources}))).into_response()
}

#[derive(Debug, Deserialize)]
struct DecisionsQuery {
    limit: Option<usize>,
}

async fn admin_decisions_handler(
    Query(query): Query<DecisionsQuery>,
    State(state): State<AppState>,
) -> Response {
    let decisions: Vec<Value> = state
        .ring
        .snapshot(query.limit.unwrap_or(50))
        .into_iter()
        .map(|record| {
            json!({
                "timestamp": record.timestamp,
                "agent_id": record.agent_id,
                "parent_agent": record.parent_agent,
                "tool": record.tool,
                "action": record.action,
                "decision": record.decision,
                "reason": record.reason,
                "params_hash": record.params_hash,
                "latency_ms": record.latency_ms,
                "trace_id": record.trace_id,
                "policy_fingerprint": record.policy_fingerprint,
            })
        })
        .collect();
    (StatusCode::OK, Json(json!({"decisions": decisions}))).into_response()
}

async fn admin_pending_approvals_handler(State(state): State<AppState>) -> Response {
    let pending: Vec<Value> = state
        .approvals
        .list_pending()
        .into_iter()
        .map(|approval| {
            json!({
                "id": approval.id,
                "agent_id": approval.agent_id,
                "parent_agent": approval.parent_agent,
                "tool": approval.tool,
                "action": approval.action,
                "params_hash": canonicalize_params(&approval.params),
                "status": approval.status.to_string(),
                "created_at": approval.created_at,
            })
        })
        .collect();
    (StatusCode::OK, Json(json!({"pending_approvals": pending}))).into_response()
}
