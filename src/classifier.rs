//! Response Classifier
//!
//! Classifies a raw model reply as either:
//! - Structured: a stock comparison chart or a budget plan table
//! - Conversational: anything else, kept as the original text

use serde_json::Value;
use tracing::debug;

use crate::models::{BudgetPlanPayload, MessageContent, StockChartPayload};

pub const STOCK_CHART_TYPE: &str = "stock_chart";
pub const BUDGET_PLAN_TYPE: &str = "budget_plan";

/// Response classifier
pub struct ResponseClassifier;

impl ResponseClassifier {
    /// Classify a raw reply.
    ///
    /// Anything that is not a recognized payload comes back as `Text` holding
    /// `raw` unchanged, including well-formed JSON with an unknown `type`.
    pub fn classify(raw: &str) -> MessageContent {
        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            return MessageContent::text(raw);
        };

        let kind = value.get("type").and_then(Value::as_str).map(str::to_owned);
        let has_data = value.get("data").is_some_and(is_truthy);

        let structured = match kind.as_deref() {
            Some(STOCK_CHART_TYPE) if has_data => {
                serde_json::from_value::<StockChartPayload>(value)
                    .map(MessageContent::StockChart)
                    .map_err(|e| debug!("stock_chart payload did not decode: {}", e))
                    .ok()
            }
            Some(BUDGET_PLAN_TYPE) if has_data => {
                serde_json::from_value::<BudgetPlanPayload>(value)
                    .map(MessageContent::BudgetPlan)
                    .map_err(|e| debug!("budget_plan payload did not decode: {}", e))
                    .ok()
            }
            _ => None,
        };

        structured.unwrap_or_else(|| MessageContent::text(raw))
    }
}

/// A `data` field counts as present unless it is null, false, zero or an empty string.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
