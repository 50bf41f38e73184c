//! # aegis-approval
//!
//! The approval-gate state machine (Module E): a soft-deny that converts a
//! `Decision::ApprovalRequired` into a pending token a designated approver
//! can release. Release is a single atomic critical section so a burst of
//! concurrent releases on the same id can never execute twice.

pub mod error;
pub mod model;
pub mod store;

pub use error::ApprovalError;
pub use model::{ApprovalStatus, PendingApproval, PermissionRef, ReleasedRequest};
pub use store::{ApprovalStore, DEFAULT_TTL_SECONDS};
