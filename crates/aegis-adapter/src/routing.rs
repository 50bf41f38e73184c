// routing.rs — RoutingAdapter: dispatches to one of several ToolAdapters by
// tool name. The orchestrator only holds a single `Arc<dyn ToolAdapter>`;
// this is how a daemon wires up more than one mock adapter behind it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{AdapterError, ToolAdapter};

#[derive(Default)]
pub struct RoutingAdapter {
    routes: HashMap<String, Arc<dyn ToolAdapter>>,
}

impl RoutingAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, tool: impl Into<String>, adapter: Arc<dyn ToolAdapter>) -> Self {
        self.routes.insert(tool.into(), adapter);
        self
    }
}

#[async_trait]
impl ToolAdapter for RoutingAdapter {
    async fn invoke(&self, tool: &str, action: &str, params: &Value) -> Result<Value, AdapterError> {
        match self.routes.get(tool) {
            Some(adapter) => adapter.invoke(tool, action, params).await,
            None => Err(AdapterError::UnknownAction {
                tool: tool.to_string(),
                action: action.to_string(),
            }),
        }
    }
}
