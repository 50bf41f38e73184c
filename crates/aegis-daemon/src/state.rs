// state.rs — shared axum application state.

use std::sync::Arc;
use std::time::Duration;

use aegis_approval::ApprovalStore;
use aegis_audit::DecisionRing;
use aegis_gateway::DispatchOrchestrator;
use aegis_policy::PolicyIndex;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<DispatchOrchestrator>,
    pub index: Arc<PolicyIndex>,
    pub approvals: Arc<ApprovalStore>,
    pub ring: Arc<DecisionRing>,
    pub request_timeout: Duration,
}
