// telemetry.rs — the out-of-scope external collaborator from spec §1.
//
// A real OTLP exporter behind OTEL_ENDPOINT is not implemented here (out of
// scope); TracingTelemetry is what runs when OTEL_ENDPOINT is unset, which is
// always, in this repo.

use crate::record::DecisionRecord;

pub trait Telemetry: Send + Sync {
    fn emit(&self, record: &DecisionRecord);
}

/// Logs a structured `tracing::info!` span per decision. Params never
/// appear here — only their hash.
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn emit(&self, record: &DecisionRecord) {
        tracing::info!(
            agent_id = %record.agent_id,
            parent_agent = record.parent_agent.as_deref().unwrap_or(""),
            tool = %record.tool,
            action = %record.action,
            decision = %record.decision,
            reason = record.reason.as_deref().unwrap_or(""),
            params_hash = %record.params_hash,
            latency_ms = record.latency_ms.unwrap_or(0),
            trace_id = %record.trace_id,
            policy_fingerprint = %record.policy_fingerprint,
            "dispatch decision"
        );
    }
}

/// No-op sink, used in tests that don't care about telemetry output.
pub struct NullTelemetry;

impl Telemetry for NullTelemetry {
    fn emit(&self, _record: &DecisionRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn null_telemetry_does_not_panic() {
        let telemetry = NullTelemetry;
        telemetry.emit(&DecisionRecord {
            timestamp: Utc::now(),
            agent_id: "a".to_string(),
            parent_agent: None,
            tool: "payments".to_string(),
            action: "create".to_string(),
            decision: "allow".to_string(),
            reason: None,
            params_hash: "deadbeef".to_string(),
            latency_ms: Some(1),
            trace_id: Uuid::new_v4(),
            policy_fingerprint: "fp".to_string(),
        });
    }
}
