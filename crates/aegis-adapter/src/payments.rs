// payments.rs — MockPaymentsAdapter: fabricates payment records for the
// `payments/create` and `payments/refund` actions.

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{AdapterError, ToolAdapter};

pub struct MockPaymentsAdapter;

#[async_trait]
impl ToolAdapter for MockPaymentsAdapter {
    async fn invoke(&self, tool: &str, action: &str, params: &Value) -> Result<Value, AdapterError> {
        if tool != "payments" {
            return Err(AdapterError::UnknownAction {
                tool: tool.to_string(),
                action: action.to_string(),
            });
        }

        match action {
            "create" => {
                let amount = params
                    .get("amount")
                    .ok_or_else(|| AdapterError::MissingParam("amount".to_string()))?;
                let currency = params.get("currency").cloned().unwrap_or(json!("USD"));
                Ok(json!({
                    "payment_id": Uuid::new_v4().to_string(),
                    "status": "created",
                    "amount": amount,
                    "currency": currency,
                }))
            }
            "refund" => {
                let amount = params
                    .get("amount")
                    .ok_or_else(|| AdapterError::MissingParam("amount".to_string()))?;
                Ok(json!({
                    "refund_id": Uuid::new_v4().to_string(),
                    "status": "refunded",
                    "amount": amount,
                }))
            }
            other => Err(AdapterError::UnknownAction {
                tool: tool.to_string(),
                action: other.to_string(),
            }),
        }
    }
}
