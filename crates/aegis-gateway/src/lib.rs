//! # aegis-gateway
//!
//! The dispatch orchestrator (Module G): the one component that ties the
//! policy index, approval store, decision ring, telemetry, and tool adapter
//! together into `dispatch`/`release`.

pub mod orchestrator;

pub use orchestrator::{DispatchOrchestrator, DispatchOutcome};
