// error.rs — Error types for the approval store.

use thiserror::Error;
use uuid::Uuid;

/// Outcome of a failed `release` call — not a catch-all error, each variant
/// is a distinct, expected branch of the release state machine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApprovalError {
    #[error("approval '{0}' not found")]
    NotFound(Uuid),

    #[error("approval '{id}' is not pending (current status: {current_status})")]
    Conflict { id: Uuid, current_status: String },

    #[error("approval '{0}' has expired")]
    Expired(Uuid),
}
