//! # aegis-adapter
//!
//! `ToolAdapter` — the out-of-scope external collaborator from spec §1 —
//! plus two mock implementations concrete enough to drive spec §8's
//! end-to-end scenarios. Not a production integration.

pub mod error;
pub mod files;
pub mod payments;
pub mod routing;

pub use error::AdapterError;
pub use files::MockFilesAdapter;
pub use payments::MockPaymentsAdapter;
pub use routing::RoutingAdapter;

use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait ToolAdapter: Send + Sync {
    async fn invoke(&self, tool: &str, action: &str, params: &Value) -> Result<Value, AdapterError>;
}
