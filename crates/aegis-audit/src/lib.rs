//! # aegis-audit
//!
//! Decision bookkeeping (§3): the bounded Decision Ring (Module F), SHA-256
//! param hashing, and the `Telemetry` boundary that dispatch emits to.
//! Persistent decisions and a real OTLP exporter are out of scope.

pub mod hasher;
pub mod record;
pub mod ring;
pub mod telemetry;

pub use hasher::{canonicalize_params, hash_bytes, hash_str};
pub use record::DecisionRecord;
pub use ring::{DecisionRing, DEFAULT_RING_SIZE};
pub use telemetry::{NullTelemetry, Telemetry, TracingTelemetry};
